//! Image file helpers and diagnostics shared by the CLI and benches.
//!
//! The library proper never touches the filesystem; everything that loads
//! or saves images lives here.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::{GenericImageView, RgbaImage};

use crate::error::Result;
use crate::models::BitMatrix;
use crate::utils::luminance::LuminanceSource;

fn max_dim_from_env() -> Option<u32> {
    match env::var("SCANVIEW_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image as RGBA, downscaled when `SCANVIEW_MAX_DIM` is set and
/// smaller than its longest side.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let img = image::open(path)?;
    let rgba = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgba8(),
        _ => img.to_rgba8(),
    };
    Ok(rgba)
}

/// Write an image; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
    image.save(path)?;
    Ok(())
}

/// Summary statistics for luminance data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayStats {
    /// Minimum luminance.
    pub min: u8,
    /// Maximum luminance.
    pub max: u8,
    /// Average luminance.
    pub avg: u8,
}

/// Summary statistics for a binary matrix.
#[derive(Debug, Clone, Copy)]
pub struct BinaryStats {
    /// Count of black pixels.
    pub black_pixels: usize,
    /// Total pixels in the matrix.
    pub total_pixels: usize,
    /// Ratio of black pixels to total pixels.
    pub black_ratio: f64,
}

/// Compute min/max/avg of a luminance source.
pub fn grayscale_stats(source: &LuminanceSource) -> GrayStats {
    let luma = source.as_slice();
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in luma {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    if luma.is_empty() {
        return GrayStats { min: 0, max: 0, avg: 0 };
    }
    GrayStats {
        min,
        max,
        avg: (sum / luma.len() as u64) as u8,
    }
}

/// Compute black pixel stats for a binary matrix.
pub fn binary_stats(binary: &BitMatrix) -> BinaryStats {
    let black = binary.count_set();
    let total = binary.width() * binary.height();
    let ratio = if total == 0 {
        0.0
    } else {
        black as f64 / total as f64
    };
    BinaryStats {
        black_pixels: black,
        total_pixels: total,
        black_ratio: ratio,
    }
}

/// Image files under `root`, recursively, sorted. A file path is returned
/// as-is.
pub fn collect_images<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if ext == "png" || ext == "jpg" || ext == "jpeg" || ext == "gif" || ext == "bmp" {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX epoch")
            .as_nanos();
        let sequence = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = env::temp_dir().join(format!("scanview_tools_{nanos}_{sequence}"));
        fs::create_dir_all(&path).expect("failed to create temp dir");
        path
    }

    #[test]
    fn test_grayscale_stats() {
        let source = LuminanceSource::from_luma(vec![10, 20, 30, 40], 2, 2).unwrap();
        assert_eq!(
            grayscale_stats(&source),
            GrayStats {
                min: 10,
                max: 40,
                avg: 25
            }
        );
    }

    #[test]
    fn test_binary_stats() {
        let mut matrix = BitMatrix::new(4, 2);
        matrix.set(0, 0, true);
        matrix.set(3, 1, true);
        let stats = binary_stats(&matrix);
        assert_eq!(stats.black_pixels, 2);
        assert_eq!(stats.total_pixels, 8);
        assert!((stats.black_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_save_load_and_collect() {
        let dir = temp_dir();
        let nested = dir.join("nested");
        fs::create_dir_all(&nested).unwrap();
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        save_image(&image, dir.join("a.png")).unwrap();
        save_image(&image, nested.join("b.png")).unwrap();
        fs::write(dir.join("notes.txt"), "skip").unwrap();

        let found = collect_images(&dir);
        assert_eq!(found.len(), 2);
        assert_eq!(collect_images(&found[0]), vec![found[0].clone()]);

        let loaded = load_rgba(&found[0]).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [1, 2, 3, 255]);
        let _ = fs::remove_dir_all(dir);
    }
}
