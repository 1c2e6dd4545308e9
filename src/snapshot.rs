// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 截图保存

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;
use tracing::info;

use crate::gen_time_string;

/// 把标注后的画面保存为 PNG, 返回文件路径
pub fn save_snapshot(dir: &Path, frame: &RgbaImage) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
    let path = dir.join(format!("snapshot-{}.png", gen_time_string("")));
    frame
        .save(&path)
        .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    info!("📸 截图已保存: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_save_snapshot_creates_png() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let frame = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));

        let path = save_snapshot(&target, &frame).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }
}
