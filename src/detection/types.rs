// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统数据结构定义
use image::RgbaImage;

// ========== 数据结构 ==========

/// 检测框 (绝对像素坐标, 左上 + 右下)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// 由归一化的中心点格式 (cx, cy, w, h) 还原到图像坐标
    pub fn from_normalized_cxcywh(cx: f32, cy: f32, w: f32, h: f32, width: f32, height: f32) -> Self {
        Self {
            x1: (cx - 0.5 * w) * width,
            y1: (cy - 0.5 * h) * height,
            x2: (cx + 0.5 * w) * width,
            y2: (cy + 0.5 * h) * height,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// 裁剪到图像范围内
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }
}

/// 单个检测结果
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    pub class_id: usize,
    pub score: f32,
    pub bbox: BBox,
}

/// 配置更新消息 (渲染线程 → 检测线程)
#[derive(Clone, Debug)]
pub enum DetectorControl {
    SetConfidence(f32),
}

/// 检测输出 (检测线程 → 渲染线程)
#[derive(Clone, Debug)]
pub struct DetectorOutput {
    pub generation: usize,
    pub frame: RgbaImage, // 已绘制检测框
    pub detections: Vec<Detection>,
    pub new_objects: Vec<String>,
    pub inference_ms: f64,
    pub inference_fps: f64,
}
