// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测器线程 (Detection Worker)
/// 职责: 接收CapturedFrame → DETR检测 → 新目标判定 → 绘制 → 发送DetectorOutput
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use image::{buffer::ConvertBuffer, RgbImage, RgbaImage};
use tracing::{debug, info, warn};

use super::novelty::SeenObjects;
use super::overlay::Overlay;
use super::types::{DetectorControl, DetectorOutput};
use super::ObjectDetector;
use crate::capture::CapturedFrame;

pub struct DetectionWorker<D: ObjectDetector> {
    detector: D,
    overlay: Overlay,
    seen: SeenObjects,
    frames_rx: Receiver<CapturedFrame>,
    control_rx: Receiver<DetectorControl>,
    output_tx: Sender<DetectorOutput>,
    // 判断帧所属的采集会话是否仍在运行
    is_live: fn(usize) -> bool,

    // 统计
    count: u64,
    last: Instant,
    current_fps: f64,
}

impl<D: ObjectDetector> DetectionWorker<D> {
    pub fn new(
        detector: D,
        overlay: Overlay,
        frames_rx: Receiver<CapturedFrame>,
        control_rx: Receiver<DetectorControl>,
        output_tx: Sender<DetectorOutput>,
    ) -> Self {
        Self {
            detector,
            overlay,
            seen: SeenObjects::new(),
            frames_rx,
            control_rx,
            output_tx,
            is_live: crate::capture::is_active,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
        }
    }

    /// 阻塞运行, 直到采集端或渲染端关闭通道
    pub fn run(mut self) {
        info!("🔍 检测模块启动, 等待数据...");

        while let Ok(frame) = self.frames_rx.recv() {
            self.apply_controls();

            // 已停止会话的残留帧不参与新目标判定
            if !(self.is_live)(frame.generation) {
                debug!("⏭️ 丢弃过期帧 (generation {})", frame.generation);
                continue;
            }

            let output = match self.process(frame) {
                Ok(output) => output,
                Err(e) => {
                    warn!("❌ 检测失败, 跳过该帧: {:#}", e);
                    continue;
                }
            };

            if self.output_tx.send(output).is_err() {
                break;
            }
        }

        info!("✅ 检测模块退出");
    }

    /// 处理渲染线程发来的配置消息
    pub fn apply_controls(&mut self) {
        for message in self.control_rx.try_iter() {
            match message {
                DetectorControl::SetConfidence(threshold) => {
                    self.detector.set_confidence_threshold(threshold);
                    info!("🎛️  置信度阈值: {:.2}", self.detector.confidence_threshold());
                }
            }
        }
    }

    /// 单帧: 检测 → 新目标 → 绘制
    pub fn process(&mut self, frame: CapturedFrame) -> Result<DetectorOutput> {
        let start = Instant::now();

        let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
            .context("RGBA图像转换失败")?;
        let rgb: RgbImage = rgba.convert();

        let detections = self.detector.detect(&rgb)?;
        let new_objects = self.seen.observe_detections(&detections);
        if !new_objects.is_empty() {
            info!("👀 新目标: {:?}", new_objects);
        }

        let mut annotated = rgba;
        self.overlay.annotate(&mut annotated, &detections);

        let inference_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.count += 1;
        if self.last.elapsed().as_secs_f64() >= 1.0 {
            self.current_fps = self.count as f64 / self.last.elapsed().as_secs_f64();
            debug!(
                "🔍 检测统计: {:.1}fps | {:.1}ms | {} 个目标",
                self.current_fps,
                inference_ms,
                detections.len()
            );
            self.count = 0;
            self.last = Instant::now();
        }

        Ok(DetectorOutput {
            generation: frame.generation,
            frame: annotated,
            detections,
            new_objects,
            inference_ms,
            inference_fps: self.current_fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::{BBox, Detection};
    use std::collections::VecDeque;

    /// 按顺序返回预设结果的检测器
    struct ScriptedDetector {
        script: VecDeque<Vec<&'static str>>,
        threshold: f32,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Vec<&'static str>>) -> Self {
            Self {
                script: script.into(),
                threshold: 0.5,
            }
        }
    }

    impl ObjectDetector for ScriptedDetector {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>> {
            let labels = self
                .script
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))?;
            Ok(labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| Detection {
                    label: label.to_string(),
                    class_id: i,
                    score: 0.9,
                    bbox: BBox { x1: 1.0, y1: 1.0, x2: 6.0, y2: 6.0 },
                })
                .collect())
        }

        fn set_confidence_threshold(&mut self, threshold: f32) {
            self.threshold = threshold;
        }

        fn confidence_threshold(&self) -> f32 {
            self.threshold
        }
    }

    fn frame(generation: usize) -> CapturedFrame {
        CapturedFrame {
            rgba: vec![0; 8 * 8 * 4],
            width: 8,
            height: 8,
            generation,
            capture_fps: 30.0,
        }
    }

    fn worker(
        script: Vec<Vec<&'static str>>,
    ) -> (
        DetectionWorker<ScriptedDetector>,
        Sender<CapturedFrame>,
        Sender<DetectorControl>,
        Receiver<DetectorOutput>,
    ) {
        let (frames_tx, frames_rx) = crossbeam_channel::bounded(4);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (output_tx, output_rx) = crossbeam_channel::unbounded();
        let mut w = DetectionWorker::new(
            ScriptedDetector::new(script),
            Overlay::new(None, [0, 255, 0], true),
            frames_rx,
            control_rx,
            output_tx,
        );
        w.is_live = |_| true;
        (w, frames_tx, control_tx, output_rx)
    }

    #[test]
    fn test_process_reports_new_objects_and_draws() {
        let (mut w, _f, _c, _o) = worker(vec![vec!["person"], vec!["person"], vec!["dog"]]);

        let out = w.process(frame(3)).unwrap();
        assert_eq!(out.generation, 3);
        assert_eq!(out.new_objects, vec!["person"]);
        assert_eq!(out.frame.get_pixel(1, 1).0, [0, 255, 0, 255]);

        assert!(w.process(frame(3)).unwrap().new_objects.is_empty());
        assert_eq!(w.process(frame(3)).unwrap().new_objects, vec!["dog"]);
    }

    #[test]
    fn test_bad_frame_is_an_error() {
        let (mut w, _f, _c, _o) = worker(vec![vec![]]);
        let mut bad = frame(1);
        bad.rgba.truncate(10);
        assert!(w.process(bad).is_err());
    }

    #[test]
    fn test_controls() {
        let (mut w, _f, control_tx, _o) = worker(vec![]);
        control_tx.send(DetectorControl::SetConfidence(0.8)).unwrap();
        control_tx.send(DetectorControl::SetConfidence(0.3)).unwrap();
        w.apply_controls();
        assert_eq!(w.detector.confidence_threshold(), 0.3);
    }

    #[test]
    fn test_run_ignores_frames_from_stopped_capture() {
        // 第 1 代已停止, 第 2 代为当前会话; 脚本只为实际处理的帧准备
        let (mut w, frames_tx, _c, output_rx) = worker(vec![vec!["cat"], vec!["cat"]]);
        w.is_live = |generation| generation == 2;
        frames_tx.send(frame(1)).unwrap();
        frames_tx.send(frame(1)).unwrap();
        frames_tx.send(frame(2)).unwrap();
        drop(frames_tx);

        w.run();
        let outputs: Vec<_> = output_rx.try_iter().collect();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].generation, 2);
        assert_eq!(outputs[0].new_objects, vec!["cat"]);
    }

    #[test]
    fn test_run_skips_failures_and_exits_on_close() {
        // 第二帧脚本耗尽 → 检测失败 → 跳过
        let (w, frames_tx, _c, output_rx) = worker(vec![vec!["cup"]]);
        frames_tx.send(frame(1)).unwrap();
        frames_tx.send(frame(1)).unwrap();
        drop(frames_tx);

        w.run();
        let outputs: Vec<_> = output_rx.try_iter().collect();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].new_objects, vec!["cup"]);
    }
}
