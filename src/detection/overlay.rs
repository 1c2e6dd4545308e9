// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 检测框绘制

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{info, warn};

use super::types::Detection;

const LINE_WIDTH: i32 = 2;
const FONT_SIZE: f32 = 18.0;

/// 在画面上绘制检测框与标签
pub struct Overlay {
    font: Option<FontVec>,
    color: Rgba<u8>,
    show_confidence: bool,
}

impl Overlay {
    pub fn new(font: Option<FontVec>, color: [u8; 3], show_confidence: bool) -> Self {
        Self {
            font,
            color: Rgba([color[0], color[1], color[2], 255]),
            show_confidence,
        }
    }

    /// 加载字体, 失败时只画框不画文字
    pub fn load_font(path: &Path) -> Option<FontVec> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("⚠️ 字体加载失败 {}: {}, 标签文字将不显示", path.display(), e);
                return None;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                info!("✅ 字体加载成功: {}", path.display());
                Some(font)
            }
            Err(e) => {
                warn!("⚠️ 字体解析失败 {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn label_text(&self, detection: &Detection) -> String {
        if self.show_confidence {
            format!("{} {:.2}", detection.label, detection.score)
        } else {
            detection.label.clone()
        }
    }

    pub fn annotate(&self, frame: &mut RgbaImage, detections: &[Detection]) {
        let (width, height) = (frame.width() as f32, frame.height() as f32);

        for detection in detections {
            let bbox = detection.bbox.clamp_to(width - 1.0, height - 1.0);
            let (x, y) = (bbox.x1 as i32, bbox.y1 as i32);
            let (w, h) = (bbox.width() as i32, bbox.height() as i32);
            if w <= 0 || h <= 0 {
                continue;
            }

            // 边框 (向内加粗)
            for i in 0..LINE_WIDTH {
                let (rw, rh) = (w - 2 * i, h - 2 * i);
                if rw <= 0 || rh <= 0 {
                    break;
                }
                draw_hollow_rect_mut(
                    frame,
                    Rect::at(x + i, y + i).of_size(rw as u32, rh as u32),
                    self.color,
                );
            }

            // 标签: 框上方, 超出顶部则放到框内
            if let Some(font) = &self.font {
                let text = self.label_text(detection);
                let scale = PxScale::from(FONT_SIZE);
                let (tw, th) = text_size(scale, font, &text);
                let ty = if y - th as i32 - 4 >= 0 { y - th as i32 - 4 } else { y };
                draw_filled_rect_mut(
                    frame,
                    Rect::at(x, ty).of_size(tw.max(1) + 4, th.max(1) + 4),
                    self.color,
                );
                draw_text_mut(frame, Rgba([0, 0, 0, 255]), x + 2, ty + 2, scale, font, &text);
            }
        }
    }
}
