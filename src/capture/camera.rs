// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 摄像头输入模块 - 独立的摄像头解码器
//!
//! 处理本地摄像头输入,支持 DirectShow(Windows) / AVFoundation(macOS) / V4L2(Linux)

use super::capture_filter::CaptureFilter;
use super::CapturedFrame;
use crossbeam_channel::Sender;
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use std::collections::HashMap;
use tracing::{error, info, warn};

const MAX_RETRIES: usize = 3;

/// 限定解码输出为 CaptureFilter 能直接处理的像素格式, 原生 YUV420P 摄像头无需转换
const CAPTURE_FILTER: &str = "format=pix_fmts=yuv420p|yuvj420p|rgba";

/// 摄像头参数
#[derive(Clone, Debug, Default)]
pub struct CameraOptions {
    pub device_index: usize,
    pub device_name: Option<String>,
    pub video_size: Option<String>, // 例如 1280x720, 不设置则由驱动协商
    pub framerate: Option<String>,
}

impl CameraOptions {
    pub fn from_args(args: &crate::Args) -> Self {
        Self {
            device_index: args.camera,
            device_name: args.camera_name.clone(),
            video_size: args.video_size.clone(),
            framerate: args.framerate.clone(),
        }
    }

    fn input_opts(&self) -> HashMap<String, String> {
        let mut opts = HashMap::new();
        if let Some(size) = &self.video_size {
            opts.insert("video_size".to_string(), size.clone());
        }
        if let Some(rate) = &self.framerate {
            opts.insert("framerate".to_string(), rate.clone());
        }
        opts
    }
}

/// 摄像头解码器结构
pub struct CameraCapture {
    options: CameraOptions,
    generation: usize,
    frames_tx: Sender<CapturedFrame>,
}

impl CameraCapture {
    pub fn new(options: CameraOptions, generation: usize, frames_tx: Sender<CapturedFrame>) -> Self {
        Self {
            options,
            generation,
            frames_tx,
        }
    }

    /// 启动摄像头解码 (阻塞到采集结束)
    pub fn run(&mut self) {
        info!("🎥 摄像头解码器启动 (Gen: {})", self.generation);

        let device_name = self
            .options
            .device_name
            .clone()
            .or_else(|| lookup_camera_name(self.options.device_index));
        let camera_url = format_camera_url(self.options.device_index, device_name.as_deref());
        info!("📷 设备索引: {} | 输入: {}", self.options.device_index, camera_url);

        self.decode_camera(&camera_url);
    }

    /// 摄像头解码实现
    fn decode_camera(&self, camera_input: &str) {
        let format = platform_format();
        info!("🔍 使用格式: {}, 输入: {}", format, camera_input);

        let mut retry_count = 0;
        loop {
            if !super::is_active(self.generation) {
                return;
            }

            // 构建帧处理管线
            let filter = CaptureFilter::new(self.generation, self.frames_tx.clone());
            let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
            let pipe = pipe.filter("capture", Box::new(filter));
            let out = create_null_output().add_frame_pipeline(pipe);

            let mut input = Input::new(camera_input).set_format(format);
            let opts = self.options.input_opts();
            if !opts.is_empty() {
                input = input.set_input_opts(opts.into_iter().collect::<Vec<_>>());
            }

            let ctx_result = FfmpegContext::builder()
                .input(input)
                .filter_desc(CAPTURE_FILTER)
                .output(out)
                .build();

            let ctx = match ctx_result {
                Ok(c) => c,
                Err(e) => {
                    retry_count += 1;
                    error!("❌ 摄像头构建错误: {}", e);
                    if retry_count >= MAX_RETRIES {
                        error!("❌ 摄像头构建失败 (重试{}次)", MAX_RETRIES);
                        warn!("💡 提示: 请检查设备名称是否正确,或尝试关闭其他占用摄像头的程序");
                        return;
                    }
                    warn!(
                        "⚠️ 摄像头忙或无法打开, 1秒后重试... ({}/{})",
                        retry_count, MAX_RETRIES
                    );
                    std::thread::sleep(std::time::Duration::from_secs(1));
                    continue;
                }
            };

            let sch = match ctx.start() {
                Ok(s) => s,
                Err(e) => {
                    error!("❌ 摄像头启动失败: {}", e);
                    return;
                }
            };

            info!("✅ 摄像头连接成功,开始采集!");

            // 等待解码完成 (过滤器在代数过期时中止)
            let _ = sch.wait();
            info!("📹 摄像头采集循环结束 (Gen: {})", self.generation);
            break;
        }
    }
}

/// 平台对应的 FFmpeg 输入格式
fn platform_format() -> &'static str {
    if cfg!(target_os = "windows") {
        "dshow" // DirectShow
    } else if cfg!(target_os = "macos") {
        "avfoundation" // AVFoundation
    } else {
        "v4l2" // Video4Linux2
    }
}

/// 格式化摄像头URL - 根据平台选择
pub fn format_camera_url(index: usize, name: Option<&str>) -> String {
    if cfg!(target_os = "windows") {
        format!("video={}", name.unwrap_or("Integrated Camera"))
    } else if cfg!(target_os = "linux") {
        format!("/dev/video{}", index)
    } else {
        format!("{}", index)
    }
}

fn lookup_camera_name(index: usize) -> Option<String> {
    list_cameras()
        .into_iter()
        .find(|(i, _)| *i == index)
        .map(|(_, name)| name)
}

/// 获取可用的摄像头设备列表
pub fn list_cameras() -> Vec<(usize, String)> {
    match ez_ffmpeg::device::get_input_video_devices() {
        Ok(devices) => devices.into_iter().enumerate().collect(),
        Err(e) => {
            warn!("⚠️ 获取摄像头列表失败: {}", e);
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_opts_only_set_values() {
        let mut options = CameraOptions::default();
        assert!(options.input_opts().is_empty());

        options.video_size = Some("640x480".to_string());
        let opts = options.input_opts();
        assert_eq!(opts.get("video_size").map(String::as_str), Some("640x480"));
        assert!(!opts.contains_key("framerate"));
    }

    #[test]
    fn test_capture_filter_keeps_yuv_formats() {
        let formats: Vec<&str> = CAPTURE_FILTER
            .trim_start_matches("format=pix_fmts=")
            .split('|')
            .collect();
        assert_eq!(formats, vec!["yuv420p", "yuvj420p", "rgba"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_camera_url() {
        assert_eq!(format_camera_url(2, None), "/dev/video2");
        assert_eq!(platform_format(), "v4l2");
    }
}
