// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 命令行参数
//!
//! 所有参数都有默认值, API Key 等敏感项可以来自环境变量 / `.env` 文件

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek/deepseek-r1-distill-qwen-7b";

/// Vision Assistant Pro 参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Vision Assistant Pro - 摄像头目标检测 + 聊天助手", long_about = None)]
pub struct Args {
    /// OpenRouter API Key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 聊天补全接口地址
    #[arg(long, env = "VISION_ASSISTANT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// 聊天模型名称
    #[arg(long, env = "VISION_ASSISTANT_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    /// HTTP-Referer 请求头
    #[arg(long, default_value = "https://github.com/vision-assistant/vision-assistant")]
    pub referer: String,

    /// X-Title 请求头
    #[arg(long, default_value = "Vision Assistant Pro")]
    pub title: String,

    /// 请求超时 (秒)
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// DETR ONNX 模型路径
    #[arg(short, long, default_value = "models/detr-resnet-50.onnx")]
    pub model: PathBuf,

    /// 类别名称文件 (HuggingFace config.json, 含 id2label)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// 置信度阈值 (覆盖配置文件)
    #[arg(long)]
    pub conf: Option<f32>,

    /// 短边缩放尺寸
    #[arg(long, default_value_t = 800)]
    pub shortest_edge: u32,

    /// 长边上限
    #[arg(long, default_value_t = 1333)]
    pub longest_edge: u32,

    /// ONNX Runtime 推理线程数
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    /// 摄像头设备索引
    #[arg(short, long, default_value_t = 0)]
    pub camera: usize,

    /// 摄像头设备名称 (Windows dshow 需要)
    #[arg(long)]
    pub camera_name: Option<String>,

    /// 采集分辨率, 例如 1280x720
    #[arg(long)]
    pub video_size: Option<String>,

    /// 采集帧率, 例如 30
    #[arg(long)]
    pub framerate: Option<String>,

    /// 标注字体 (TTF)
    #[arg(long, default_value = "assets/font/DejaVuSans.ttf")]
    pub font: PathBuf,

    /// UI配置文件
    #[arg(long, default_value = "vision_assistant.json")]
    pub settings: PathBuf,

    /// 截图保存目录
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

impl Args {
    /// 取出 API Key, 缺失或为空时报错
    pub fn require_api_key(&self) -> Result<String> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => bail!("Please set OPENROUTER_API_KEY in your .env file"),
        }
    }

    /// 截图目录: 参数优先, 否则 `<图片目录>/vision-assistant`
    pub fn snapshot_dir(&self) -> PathBuf {
        match &self.snapshot_dir {
            Some(dir) => dir.clone(),
            None => dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vision-assistant"),
        }
    }
}
