// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
#![allow(clippy::type_complexity)]
pub mod app; // GUI: 视频面板 + 聊天面板
pub mod capture; // 摄像头采集系统
pub mod chat; // 聊天补全客户端
pub mod config; // 命令行参数
pub mod detection; // DETR 检测 + 标注
pub mod settings; // UI配置 (JSON)
pub mod snapshot; // 截图保存

pub use crate::config::Args;
pub use crate::detection::{Detection, Detr, DetrConfig, LabelMap, ObjectDetector};

/// 生成本地时间字符串, 各字段之间用 `delimiter` 分隔
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S{}%3f",
        delimiter, delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
