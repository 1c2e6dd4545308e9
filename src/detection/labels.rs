// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 类别名称表
//!
//! DETR 沿用 COCO 原始 91 个类别编号, 中间有空缺 (`N/A`)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// facebook/detr-resnet-50 的 id2label
pub const DETR_COCO_LABELS: [&str; 91] = [
    "N/A",
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "N/A",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "N/A",
    "backpack",
    "umbrella",
    "N/A",
    "N/A",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "N/A",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "N/A",
    "dining table",
    "N/A",
    "N/A",
    "toilet",
    "N/A",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "N/A",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

#[derive(Deserialize)]
struct HfConfig {
    id2label: BTreeMap<String, String>,
}

/// 类别编号 → 名称
#[derive(Clone, Debug, PartialEq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::detr_coco()
    }
}

impl LabelMap {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn detr_coco() -> Self {
        Self::new(DETR_COCO_LABELS.iter().map(|s| s.to_string()).collect())
    }

    /// 从 HuggingFace config.json 的 `id2label` 字段读取
    pub fn from_hf_config(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read label config {}", path.display()))?;
        Self::from_hf_config_str(&json)
    }

    pub fn from_hf_config_str(json: &str) -> Result<Self> {
        let config: HfConfig = serde_json::from_str(json).context("Invalid id2label config")?;
        let mut pairs = Vec::with_capacity(config.id2label.len());
        for (id, name) in config.id2label {
            let id: usize = id
                .parse()
                .with_context(|| format!("Invalid class id {:?} in id2label", id))?;
            pairs.push((id, name));
        }
        if pairs.is_empty() {
            bail!("id2label is empty");
        }

        // 编号可能不连续, 空缺处填 N/A
        let len = pairs.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut names = vec!["N/A".to_string(); len];
        for (id, name) in pairs {
            names[id] = name;
        }
        Ok(Self::new(names))
    }

    pub fn name(&self, id: usize) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
