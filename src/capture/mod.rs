// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 视频采集系统 (Video Capture System)
///
/// 独立工作线程,负责摄像头解码与像素转换
/// - CameraCapture: 本地摄像头解码器 (DirectShow/AVFoundation/V4L2)
/// - CaptureFilter: 帧过滤, 转换为 RGBA 后投递给检测线程
/// - CaptureHandle: 开关摄像头 (代数ID控制旧解码器退出)
pub mod camera;
pub mod capture_filter;
pub mod pixels;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tracing::info;

pub use camera::{list_cameras, CameraCapture, CameraOptions};
pub use capture_filter::CaptureFilter;

/// 当前有效的采集代数, 不一致的解码器会自行退出
pub static ACTIVE_CAPTURE_GENERATION: AtomicUsize = AtomicUsize::new(0);

/// 已解码帧 (采集线程 → 检测线程)
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub generation: usize,
    pub capture_fps: f64,
}

/// 摄像头开关
pub struct CaptureHandle {
    options: CameraOptions,
    frames_tx: Sender<CapturedFrame>,
    generation: Option<usize>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    pub fn new(options: CameraOptions, frames_tx: Sender<CapturedFrame>) -> Self {
        Self {
            options,
            frames_tx,
            generation: None,
            thread: None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.generation.is_some()
    }

    /// 正在运行的采集代数
    pub fn generation(&self) -> Option<usize> {
        self.generation
    }

    /// 启动采集线程, 返回新的代数ID
    pub fn start(&mut self) -> usize {
        if let Some(generation) = self.generation {
            return generation;
        }
        let generation = ACTIVE_CAPTURE_GENERATION.fetch_add(1, Ordering::SeqCst) + 1;
        let options = self.options.clone();
        let frames_tx = self.frames_tx.clone();
        let handle = std::thread::Builder::new()
            .name(format!("capture-{}", generation))
            .spawn(move || {
                let mut capture = CameraCapture::new(options, generation, frames_tx);
                capture.run();
            });
        match handle {
            Ok(handle) => {
                self.thread = Some(handle);
                self.generation = Some(generation);
            }
            Err(e) => tracing::error!("❌ 采集线程启动失败: {}", e),
        }
        generation
    }

    /// 停止采集: 代数ID失效后, 解码器在下一帧退出
    pub fn stop(&mut self) {
        if self.generation.take().is_some() {
            ACTIVE_CAPTURE_GENERATION.fetch_add(1, Ordering::SeqCst);
            // 不等待线程: FFmpeg 读取可能阻塞到下一帧
            self.thread.take();
            info!("🛑 摄像头已停止");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 代数ID是否仍然有效
pub fn is_active(generation: usize) -> bool {
    ACTIVE_CAPTURE_GENERATION.load(Ordering::SeqCst) == generation
}
