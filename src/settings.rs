// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! UI配置 - 通过JSON文件保存可在界面上调整的参数

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// 界面参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub confidence_threshold: f32, // 检测置信度阈值
    pub box_color: [u8; 3],        // 检测框颜色 (RGB)
    pub show_confidence: bool,     // 标签是否显示置信度
    pub auto_start_camera: bool,   // 启动时自动打开摄像头
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            box_color: [0, 255, 0],
            show_confidence: true,
            auto_start_camera: false,
        }
    }
}

impl UiSettings {
    /// 从JSON文件加载配置
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    info!("✅ 配置已从 {} 加载", path.display());
                    settings
                }
                Err(e) => {
                    warn!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("📝 配置文件不存在,创建默认配置...");
                let settings = Self::default();
                settings.save(path);
                settings
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    warn!("❌ 保存配置失败: {}", e);
                } else {
                    info!("💾 配置已保存到 {}", path.display());
                }
            }
            Err(e) => warn!("❌ 序列化配置失败: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = UiSettings::load(&path);
        assert_eq!(settings, UiSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = UiSettings {
            confidence_threshold: 0.7,
            box_color: [255, 0, 0],
            show_confidence: false,
            auto_start_camera: true,
        };
        settings.save(&path);
        assert_eq!(UiSettings::load(&path), settings);
    }

    #[test]
    fn test_partial_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, r#"{ "confidence_threshold": 0.3 }"#).unwrap();
        let partial = UiSettings::load(&path);
        assert_eq!(partial.confidence_threshold, 0.3);
        assert_eq!(partial.box_color, [0, 255, 0]);

        fs::write(&path, "not json").unwrap();
        assert_eq!(UiSettings::load(&path), UiSettings::default());
    }
}
