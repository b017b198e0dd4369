//! Grayscale mapping of a B snapshot
//!
//! High B renders dark: a value `v` maps to `clamp(round((1 − v) · 255), 0, 255)`.

use std::io::{self, Write};

/// Grayscale intensity for a B concentration
#[inline]
#[must_use]
pub fn grayscale_intensity(value: f64) -> u8 {
    ((1.0 - value) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Map a whole row-major snapshot to one byte per cell
#[must_use]
pub fn render_grayscale(snapshot: &[f64]) -> Vec<u8> {
    snapshot.iter().copied().map(grayscale_intensity).collect()
}

/// Write a snapshot as a binary PGM (P5) image
///
/// # Errors
///
/// Returns an error if `snapshot` does not hold `width × height` values or the writer
/// fails.
pub fn write_pgm<W: Write>(
    writer: &mut W,
    snapshot: &[f64],
    width: usize,
    height: usize,
) -> io::Result<()> {
    if width.checked_mul(height) != Some(snapshot.len()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "snapshot holds {} values, expected {}x{}",
                snapshot.len(),
                width,
                height
            ),
        ));
    }
    write!(writer, "P5\n{width} {height}\n255\n")?;
    writer.write_all(&render_grayscale(snapshot))?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_endpoints() {
        assert_eq!(grayscale_intensity(0.0), 255);
        assert_eq!(grayscale_intensity(1.0), 0);
        assert_eq!(grayscale_intensity(0.5), 128);
    }

    #[test]
    fn test_intensity_clamps_out_of_range() {
        assert_eq!(grayscale_intensity(-0.5), 255);
        assert_eq!(grayscale_intensity(2.0), 0);
    }

    #[test]
    fn test_pgm_layout() {
        let mut out = Vec::new();
        write_pgm(&mut out, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0], 3, 2).unwrap();
        let header = b"P5\n3 2\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn test_pgm_rejects_mismatched_dimensions() {
        let mut out = Vec::new();
        let err = write_pgm(&mut out, &[0.0; 5], 3, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
