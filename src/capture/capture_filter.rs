// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// FFmpeg采集过滤器: 摄像头帧 → RGBA → 检测线程
use super::pixels::{self, PIX_FMT_RGBA, PIX_FMT_YUV420P, PIX_FMT_YUVJ420P};
use super::{is_active, CapturedFrame};
use crossbeam_channel::{Sender, TrySendError};
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct CaptureFilter {
    generation: usize,
    frames_tx: Sender<CapturedFrame>,
    count: usize,
    last: Instant,
    current_fps: f64,
    dropped_frames: usize, // 损坏/格式不支持
    busy_frames: usize,    // 检测线程忙, 未投递
    total_frames: usize,
}

impl CaptureFilter {
    pub fn new(generation: usize, frames_tx: Sender<CapturedFrame>) -> Self {
        Self {
            generation,
            frames_tx,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
            dropped_frames: 0,
            busy_frames: 0,
            total_frames: 0,
        }
    }

    fn drop_frame(&mut self, reason: &str) -> Result<Option<Frame>, String> {
        self.dropped_frames += 1;
        if self.total_frames <= 10 {
            warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
        }
        Ok(None)
    }

    /// 从 AVFrame 中读出 RGBA 数据
    ///
    /// # Safety
    /// `frame` 必须是 FFmpeg 解码出的有效视频帧
    unsafe fn extract_rgba(frame: &Frame, w: u32, h: u32) -> Result<Vec<u8>, &'static str> {
        let av = &*frame.as_ptr();
        let (width, height) = (w as usize, h as usize);

        match av.format {
            PIX_FMT_RGBA => {
                if av.data[0].is_null() || av.linesize[0] <= 0 {
                    return Err("RGBA指针为空");
                }
                let stride = av.linesize[0] as usize;
                let len = stride * (height - 1) + width * 4;
                let src = std::slice::from_raw_parts(av.data[0], len);
                pixels::rgba_from_packed(src, stride, width, height).ok_or("步长异常")
            }
            PIX_FMT_YUV420P | PIX_FMT_YUVJ420P => {
                if av.data[0].is_null() || av.data[1].is_null() || av.data[2].is_null() {
                    return Err("YUV指针为空");
                }
                if av.linesize[0] <= 0 || av.linesize[1] <= 0 || av.linesize[2] != av.linesize[1] {
                    return Err("步长异常");
                }
                let y_stride = av.linesize[0] as usize;
                let uv_stride = av.linesize[1] as usize;
                let chroma_rows = height.div_ceil(2);
                let chroma_len = uv_stride * (chroma_rows - 1) + width.div_ceil(2);
                let y_plane = std::slice::from_raw_parts(av.data[0], y_stride * (height - 1) + width);
                let u_plane = std::slice::from_raw_parts(av.data[1], chroma_len);
                let v_plane = std::slice::from_raw_parts(av.data[2], chroma_len);
                pixels::rgba_from_yuv420p(
                    y_plane, u_plane, v_plane, y_stride, uv_stride, width, height,
                )
                .ok_or("步长异常")
            }
            _ => Err("不支持的像素格式"),
        }
    }
}

impl FrameFilter for CaptureFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        info!("✅ 采集线程启动 (Gen: {})", self.generation);
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        // 代数ID过期: 摄像头已被关闭或重新打开
        if !is_active(self.generation) {
            info!("🛑 采集器已过期 (Gen: {}), 停止解码", self.generation);
            return Err("Capture expired".to_string());
        }

        self.total_frames += 1;

        let broken = unsafe { frame.as_ptr().is_null() || frame.is_empty() } || frame.is_corrupt();
        if broken {
            return self.drop_frame("空帧/损坏帧");
        }

        let (w, h) = unsafe {
            let av = &*frame.as_ptr();
            (av.width as u32, av.height as u32)
        };
        if !pixels::valid_dimensions(w, h) {
            return self.drop_frame(&format!("非法分辨率 {}x{}", w, h));
        }

        let rgba = match unsafe { Self::extract_rgba(&frame, w, h) } {
            Ok(rgba) => rgba,
            Err(reason) => return self.drop_frame(reason),
        };

        self.count += 1;
        if self.last.elapsed().as_secs_f64() >= 1.0 {
            let elapsed = self.last.elapsed().as_secs_f64();
            self.current_fps = self.count as f64 / elapsed;
            debug!(
                "📺 采集统计: {:.1}fps | 总帧{} | 丢弃{} | 检测忙{}",
                self.current_fps, self.total_frames, self.dropped_frames, self.busy_frames
            );
            self.last = Instant::now();
            self.count = 0;
        }

        let captured = CapturedFrame {
            rgba,
            width: w,
            height: h,
            generation: self.generation,
            capture_fps: self.current_fps,
        };

        // 检测线程忙时直接丢帧, 只保留最新画面
        match self.frames_tx.try_send(captured) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.busy_frames += 1,
            Err(TrySendError::Disconnected(_)) => {
                return Err("Detector channel closed".to_string());
            }
        }

        Ok(Some(frame))
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        info!("✅ 采集线程退出 (Gen: {})", self.generation);
    }
}
