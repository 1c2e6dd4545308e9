// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统 (Detection System)
///
/// 独立工作线程,负责智能分析
/// - Detr:            DETR 目标检测 (ONNX Runtime)
/// - SeenObjects:     新目标判定
/// - Overlay:         检测框绘制
/// - DetectionWorker: 检测线程主循环
pub mod detr;
pub mod labels;
pub mod novelty;
pub mod overlay;
pub mod types;
pub mod worker;

use anyhow::Result;
use image::RgbImage;

pub use detr::{Detr, DetrConfig};
pub use labels::LabelMap;
pub use novelty::{announcement, SeenObjects};
pub use overlay::Overlay;
pub use types::{BBox, Detection, DetectorControl, DetectorOutput};
pub use worker::DetectionWorker;

/// 统一的目标检测接口
///
/// ## 核心流程
/// ```text
/// RGB画面 → 预处理 → 推理引擎 → 后处理 → 检测结果 (原图坐标)
/// ```
pub trait ObjectDetector: Send {
    /// 检测一帧, 返回置信度高于阈值的目标
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>>;

    fn set_confidence_threshold(&mut self, threshold: f32);

    fn confidence_threshold(&self) -> f32;
}
