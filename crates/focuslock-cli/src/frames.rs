use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use focuslock_core::config::FocusLockConfig;
use focuslock_core::FrameShape;
use ndarray::Array2;

/// Read the settings file, or fall back to defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FocusLockConfig> {
    let Some(path) = path else {
        return Ok(FocusLockConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Load an image file as 16-bit grayscale, rows first.
pub fn load_gray16(path: &Path) -> Result<Array2<u16>> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_vec((h as usize, w as usize), gray.into_raw())?;
    Ok(data)
}

/// Read a raw little-endian `u16` buffer holding two frames of `shape`
/// stacked along the row axis.
pub fn read_packed(path: &Path, shape: FrameShape) -> Result<Array2<u16>> {
    let packed = shape.packed();
    let expected = packed.pixel_count() * 2;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let actual = file.metadata()?.len();
    if actual != expected as u64 {
        bail!(
            "{} holds {} bytes, expected {} for a packed {}x{} pair",
            path.display(),
            actual,
            expected,
            shape.height,
            shape.width
        );
    }

    let mut reader = BufReader::new(file);
    let mut pixels = vec![0u16; packed.pixel_count()];
    reader.read_u16_into::<LittleEndian>(&mut pixels)?;
    Ok(Array2::from_shape_vec(packed.dim(), pixels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use image::{ImageBuffer, Luma};
    use std::io::Write;

    #[test]
    fn test_missing_config_is_default() {
        assert_eq!(load_config(None).unwrap(), FocusLockConfig::default());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focuslock.toml");
        std::fs::write(&path, "[estimator]\ndownsample = 4\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.estimator.downsample, 4);
        assert_eq!(config.refine, FocusLockConfig::default().refine);
    }

    #[test]
    fn test_bad_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[estimator\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_packed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.raw");
        let mut file = File::create(&path).unwrap();
        for v in 0u16..24 {
            file.write_u16::<LittleEndian>(v * 100).unwrap();
        }
        file.flush().unwrap();

        let data = read_packed(&path, FrameShape::new(3, 4)).unwrap();
        assert_eq!(data.dim(), (6, 4));
        assert_eq!(data[[0, 1]], 100);
        assert_eq!(data[[3, 0]], 1200);
        assert_eq!(data[[5, 3]], 2300);
    }

    #[test]
    fn test_packed_size_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.raw");
        std::fs::write(&path, [0u8; 10]).unwrap();
        assert!(read_packed(&path, FrameShape::new(3, 4)).is_err());
    }

    #[test]
    fn test_gray16_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(5, 3, |x, y| Luma([(y * 1000 + x) as u16]));
        img.save(&path).unwrap();

        let data = load_gray16(&path).unwrap();
        assert_eq!(data.dim(), (3, 5));
        assert_eq!(data[[2, 4]], 2004);
        assert_eq!(data[[0, 1]], 1);
    }
}
