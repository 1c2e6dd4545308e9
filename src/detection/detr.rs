// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// DETR (facebook/detr-resnet-50) ONNX 推理
// 包含: 模型加载、预处理、推理、后处理

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use image::{imageops, RgbImage};
use ndarray::{Array3, Array4, ArrayView3, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::labels::LabelMap;
use super::types::{BBox, Detection};
use super::ObjectDetector;

/// ImageNet 归一化参数
const IMAGE_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGE_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// DETR 配置
#[derive(Clone, Debug)]
pub struct DetrConfig {
    pub model_path: PathBuf,
    pub shortest_edge: u32,
    pub longest_edge: u32,
    pub confidence_threshold: f32,
    pub intra_threads: usize,
}

impl Default for DetrConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/detr-resnet-50.onnx"),
            shortest_edge: 800,
            longest_edge: 1333,
            confidence_threshold: 0.5,
            intra_threads: 4,
        }
    }
}

/// DETR 完整模型结构
pub struct Detr {
    session: Session,
    input_name: String,
    needs_pixel_mask: bool,
    labels: LabelMap,
    config: DetrConfig,
}

impl std::fmt::Debug for Detr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detr")
            .field("input_name", &self.input_name)
            .field("needs_pixel_mask", &self.needs_pixel_mask)
            .field("labels", &self.labels.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Detr {
    /// 加载 ONNX 模型
    pub fn new(config: DetrConfig, labels: LabelMap) -> Result<Self> {
        let path = &config.model_path;
        if !path.exists() {
            bail!("DETR model not found: {}", path.display());
        }
        info!("📦 加载 DETR 模型: {}", path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load DETR model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());
        let needs_pixel_mask = session.inputs.iter().any(|input| input.name == "pixel_mask");
        debug!(
            "DETR inputs: {:?}, outputs: {:?}",
            session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>(),
            session.outputs.iter().map(|o| &o.name).collect::<Vec<_>>()
        );

        info!("✅ DETR 模型加载成功 ({} 个类别)", labels.len());
        Ok(Self {
            session,
            input_name,
            needs_pixel_mask,
            labels,
            config,
        })
    }

    /// 预处理: 缩放 + 归一化 → NCHW 张量
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let (w0, h0) = image.dimensions();
        let (w, h) = resize_dims(w0, h0, self.config.shortest_edge, self.config.longest_edge);
        let resized = if (w, h) == (w0, h0) {
            image.clone()
        } else {
            imageops::resize(image, w, h, imageops::FilterType::Triangle)
        };
        to_normalized_tensor(&resized)
    }
}

impl ObjectDetector for Detr {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        let input = self.preprocess(image);
        let (_, _, h, w) = input.dim();

        let pixel_values = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = if self.needs_pixel_mask {
            let mask = Value::from_array(Array3::<i64>::ones((1, h, w)))
                .context("Failed to create pixel mask")?;
            self.session.run(ort::inputs![
                &self.input_name => pixel_values,
                "pixel_mask" => mask
            ])
        } else {
            self.session
                .run(ort::inputs![&self.input_name => pixel_values])
        }
        .context("DETR inference failed")?;

        let logits = outputs
            .get("logits")
            .context("DETR output `logits` missing")?
            .try_extract_array::<f32>()
            .context("Failed to extract logits")?
            .into_dimensionality::<Ix3>()
            .context("Unexpected logits shape")?;
        let boxes = outputs
            .get("pred_boxes")
            .context("DETR output `pred_boxes` missing")?
            .try_extract_array::<f32>()
            .context("Failed to extract pred_boxes")?
            .into_dimensionality::<Ix3>()
            .context("Unexpected pred_boxes shape")?;

        postprocess(
            logits,
            boxes,
            width as f32,
            height as f32,
            self.config.confidence_threshold,
            &self.labels,
        )
    }

    fn set_confidence_threshold(&mut self, threshold: f32) {
        self.config.confidence_threshold = threshold.clamp(0.0, 1.0);
    }

    fn confidence_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }
}

/// 缩放尺寸: 短边缩放到 `shortest`, 长边不超过 `longest`
pub fn resize_dims(width: u32, height: u32, shortest: u32, longest: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let (min_orig, max_orig) = (w.min(h), w.max(h));

    let mut size = shortest as f64;
    if max_orig / min_orig * size > longest as f64 {
        size = (longest as f64 * min_orig / max_orig).round();
    }

    if (height <= width && h == size) || (width <= height && w == size) {
        return (width, height);
    }

    if width < height {
        (size as u32, (size * h / w) as u32)
    } else {
        ((size * w / h) as u32, size as u32)
    }
}

/// RGB 图像 → [1, 3, H, W], 先缩放到 [0, 1] 再按 ImageNet 均值/方差归一化
pub fn to_normalized_tensor(image: &RgbImage) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            let v = pixel.0[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (v - IMAGE_MEAN[c]) / IMAGE_STD[c];
        }
    }
    tensor
}

/// 后处理: logits [1, Q, C+1] + pred_boxes [1, Q, 4] → 检测结果
///
/// 最后一个类别是 "no object", 不参与取最大值
pub fn postprocess(
    logits: ArrayView3<f32>,
    boxes: ArrayView3<f32>,
    width: f32,
    height: f32,
    threshold: f32,
    labels: &LabelMap,
) -> Result<Vec<Detection>> {
    let (batch, queries, classes) = logits.dim();
    if batch == 0 || classes < 2 {
        bail!("Unexpected logits shape: {:?}", logits.dim());
    }
    if boxes.dim() != (batch, queries, 4) {
        bail!(
            "pred_boxes shape {:?} does not match logits {:?}",
            boxes.dim(),
            logits.dim()
        );
    }

    let mut detections = Vec::new();
    for q in 0..queries {
        let row = logits.slice(ndarray::s![0, q, ..]);
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let exps: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exps.iter().sum();

        let (class_id, prob) = exps[..classes - 1]
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &e)| {
                if e > best.1 {
                    (i, e)
                } else {
                    best
                }
            });
        let score = prob / sum;
        if score <= threshold {
            continue;
        }

        let b = boxes.slice(ndarray::s![0, q, ..]);
        let bbox = BBox::from_normalized_cxcywh(b[0usize], b[1usize], b[2usize], b[3usize], width, height);
        detections.push(Detection {
            label: labels.name(class_id).to_string(),
            class_id,
            score,
            bbox,
        });
    }

    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(detections)
}
