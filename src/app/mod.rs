// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 主界面 (macroquad + egui)
///
/// - 左侧: 摄像头画面 (已绘制检测框) + 摄像头控制
/// - 右侧: 聊天记录 + 输入框
///
/// 检测在独立线程, 每条聊天消息单独开一个请求线程
pub mod transcript;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use egui_macroquad::egui;
use image::RgbaImage;
use macroquad::color::{BLACK, WHITE};
use macroquad::math::{vec2, Rect};
use macroquad::texture::{draw_texture_ex, DrawTextureParams, FilterMode, Image, Texture2D};
use macroquad::window::{clear_background, screen_height, screen_width};
use tracing::{error, info, warn};

use crate::capture::{CameraOptions, CaptureHandle, CapturedFrame};
use crate::chat::{ChatSession, ClientConfig, OpenRouterClient};
use crate::detection::{
    announcement, DetectionWorker, DetectorControl, DetectorOutput, Detr, DetrConfig, LabelMap,
    Overlay,
};
use crate::settings::UiSettings;
use crate::snapshot::save_snapshot;
use crate::Args;
use transcript::{prepare_input, Speaker, Transcript};

pub const WINDOW_TITLE: &str = "Vision Assistant Pro";
pub const WINDOW_WIDTH: i32 = 1200;
pub const WINDOW_HEIGHT: i32 = 800;

const USER_COLOR: egui::Color32 = egui::Color32::from_rgb(0x1e, 0x6f, 0xd9);
const ASSISTANT_COLOR: egui::Color32 = egui::Color32::from_rgb(0x2e, 0x9d, 0x4f);

pub struct App {
    args: Args,
    settings: UiSettings,

    // 聊天
    chat: Arc<ChatSession<OpenRouterClient>>,
    transcript: Transcript,
    input: String,
    awaiting_reply: bool,
    focus_input: bool,
    reply_tx: Sender<String>,
    reply_rx: Receiver<String>,

    // 摄像头 + 检测
    capture: CaptureHandle,
    control_tx: Sender<DetectorControl>,
    output_rx: Receiver<DetectorOutput>,
    video: Option<Texture2D>,
    last_frame: Option<RgbaImage>,
    video_rect: Rect,
    inference_fps: f64,
    inference_ms: f64,
    object_count: usize,
    status: Option<String>,
    started: Instant,
}

impl App {
    /// 加载模型、启动检测线程、创建聊天会话
    pub fn launch(args: Args) -> Result<Self> {
        let api_key = args.require_api_key()?;

        let mut settings = UiSettings::load(&args.settings);
        if let Some(conf) = args.conf {
            settings.confidence_threshold = conf.clamp(0.0, 1.0);
        }

        let labels = match &args.labels {
            Some(path) => LabelMap::from_hf_config(path)?,
            None => LabelMap::detr_coco(),
        };
        let detr = Detr::new(
            DetrConfig {
                model_path: args.model.clone(),
                shortest_edge: args.shortest_edge,
                longest_edge: args.longest_edge,
                confidence_threshold: settings.confidence_threshold,
                intra_threads: args.threads,
            },
            labels,
        )
        .context("Error loading DETR model")?;
        let overlay = Overlay::new(
            Overlay::load_font(&args.font),
            settings.box_color,
            settings.show_confidence,
        );

        // 采集 → 检测: 只缓存2帧, 检测忙时采集端丢帧
        let (frames_tx, frames_rx) = crossbeam_channel::bounded::<CapturedFrame>(2);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (output_tx, output_rx) = crossbeam_channel::bounded(2);

        let worker = DetectionWorker::new(detr, overlay, frames_rx, control_rx, output_tx);
        std::thread::Builder::new()
            .name("detection".to_string())
            .spawn(move || worker.run())
            .context("Failed to spawn detection thread")?;

        let client = OpenRouterClient::new(ClientConfig::from_args(&args, api_key));
        let chat = ChatSession::new(client);
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();

        let capture = CaptureHandle::new(CameraOptions::from_args(&args), frames_tx);

        let mut app = Self {
            args,
            settings,
            chat,
            transcript: Transcript::with_welcome(),
            input: String::new(),
            awaiting_reply: false,
            focus_input: true,
            reply_tx,
            reply_rx,
            capture,
            control_tx,
            output_rx,
            video: None,
            last_frame: None,
            video_rect: Rect::new(0.0, 0.0, screen_width() * 0.55, screen_height() - 80.0),
            inference_fps: 0.0,
            inference_ms: 0.0,
            object_count: 0,
            status: None,
            started: Instant::now(),
        };

        if app.settings.auto_start_camera {
            app.toggle_camera();
        }

        info!("✅ 系统就绪");
        Ok(app)
    }

    /// 处理后台线程发来的消息
    pub fn update(&mut self) {
        // 聊天回复
        for reply in self.reply_rx.try_iter() {
            self.transcript.push(Speaker::Assistant, reply);
            self.awaiting_reply = false;
            self.focus_input = true;
        }

        // 检测结果: 提示全部保留, 画面只保留最新一帧
        let mut latest = None;
        for output in self.output_rx.try_iter() {
            if self.capture.generation() != Some(output.generation) {
                continue;
            }
            for label in &output.new_objects {
                self.transcript.push(Speaker::Assistant, announcement(label));
            }
            latest = Some(output);
        }

        if let Some(output) = latest {
            self.inference_fps = output.inference_fps;
            self.inference_ms = output.inference_ms;
            self.object_count = output.detections.len();
            self.upload_frame(&output.frame);
            self.last_frame = Some(output.frame);
        }
    }

    /// 只在分辨率变化时重建纹理, 否则更新像素数据
    fn upload_frame(&mut self, frame: &RgbaImage) {
        let (width, height) = (frame.width() as u16, frame.height() as u16);
        let needs_rebuild = match &self.video {
            Some(tex) => tex.width() != width as f32 || tex.height() != height as f32,
            None => true,
        };

        if needs_rebuild {
            let texture = Texture2D::from_rgba8(width, height, frame.as_raw());
            texture.set_filter(FilterMode::Linear);
            self.video = Some(texture);
        } else if let Some(tex) = &self.video {
            tex.update(&Image {
                bytes: frame.as_raw().clone(),
                width,
                height,
            });
        }
    }

    pub fn draw(&self) {
        clear_background(BLACK);

        let Some(texture) = &self.video else {
            return;
        };

        // 等比缩放, 居中
        let area = self.video_rect;
        let scale = (area.w / texture.width()).min(area.h / texture.height());
        if scale <= 0.0 {
            return;
        }
        let (w, h) = (texture.width() * scale, texture.height() * scale);
        draw_texture_ex(
            texture,
            area.x + (area.w - w) / 2.0,
            area.y + (area.h - h) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, h)),
                ..Default::default()
            },
        );
    }

    pub fn draw_egui(&mut self) {
        let mut send = false;
        let mut toggle_camera = false;
        let mut take_snapshot = false;
        let mut threshold_changed = false;

        egui_macroquad::ui(|ctx| {
            // --- 右侧: 聊天面板 ---
            egui::SidePanel::right("chat_panel")
                .resizable(true)
                .default_width(WINDOW_WIDTH as f32 * 0.45)
                .min_width(280.0)
                .show(ctx, |ui| {
                    egui::TopBottomPanel::bottom("chat_input")
                        .show_separator_line(false)
                        .show_inside(ui, |ui| {
                            ui.add_space(6.0);
                            ui.horizontal(|ui| {
                                let edit = egui::TextEdit::singleline(&mut self.input)
                                    .hint_text("Type a message...")
                                    .desired_width(ui.available_width() - 70.0);
                                let response = ui.add_enabled(!self.awaiting_reply, edit);
                                if self.focus_input && !self.awaiting_reply {
                                    response.request_focus();
                                    self.focus_input = false;
                                }
                                if response.lost_focus()
                                    && ui.input(|i| i.key_pressed(egui::Key::Enter))
                                {
                                    send = true;
                                }
                                if ui
                                    .add_enabled(!self.awaiting_reply, egui::Button::new("Send"))
                                    .clicked()
                                {
                                    send = true;
                                }
                            });
                            ui.add_space(6.0);
                        });

                    egui::CentralPanel::default().show_inside(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .auto_shrink([false, false])
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in self.transcript.entries() {
                                    let color = match entry.speaker {
                                        Speaker::You => USER_COLOR,
                                        Speaker::Assistant => ASSISTANT_COLOR,
                                    };
                                    ui.horizontal_wrapped(|ui| {
                                        ui.label(
                                            egui::RichText::new(format!(
                                                "{}:",
                                                entry.speaker.name()
                                            ))
                                            .strong()
                                            .color(color),
                                        );
                                        ui.label(entry.message.as_str());
                                    });
                                    ui.add_space(8.0);
                                }
                                if self.awaiting_reply {
                                    ui.spinner();
                                }
                            });
                    });
                });

            // --- 左下: 摄像头控制 ---
            egui::TopBottomPanel::bottom("camera_controls").show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    let label = if self.capture.is_capturing() {
                        "Stop Camera"
                    } else {
                        "Start Camera"
                    };
                    if ui.button(label).clicked() {
                        toggle_camera = true;
                    }
                    if ui
                        .add_enabled(self.last_frame.is_some(), egui::Button::new("Snapshot"))
                        .clicked()
                    {
                        take_snapshot = true;
                    }
                    threshold_changed = ui
                        .add(
                            egui::Slider::new(&mut self.settings.confidence_threshold, 0.05..=0.95)
                                .text("Confidence"),
                        )
                        .changed();
                });
                ui.horizontal(|ui| {
                    if self.capture.is_capturing() {
                        ui.colored_label(
                            egui::Color32::YELLOW,
                            format!(
                                "Detection: {:.1} fps | {:.0} ms | {} objects",
                                self.inference_fps, self.inference_ms, self.object_count
                            ),
                        );
                    }
                    if let Some(status) = &self.status {
                        ui.label(status.as_str());
                    }
                });
                ui.add_space(4.0);
            });

            // 剩余区域留给视频
            let rect = ctx.available_rect();
            self.video_rect = Rect::new(rect.min.x, rect.min.y, rect.width(), rect.height());
        });

        if toggle_camera {
            self.toggle_camera();
        }
        if take_snapshot {
            self.take_snapshot();
        }
        if threshold_changed {
            let threshold = self.settings.confidence_threshold;
            if let Err(e) = self.control_tx.send(DetectorControl::SetConfidence(threshold)) {
                warn!("⚠️ 检测线程已退出, 置信度 {:.2} 未生效: {}", threshold, e);
            }
        }
        if send {
            self.send_message();
        }
    }

    /// 开关摄像头; 关闭时清空画面
    pub fn toggle_camera(&mut self) {
        if self.capture.is_capturing() {
            self.capture.stop();
            self.video = None;
            self.last_frame = None;
            self.object_count = 0;
        } else {
            let generation = self.capture.start();
            info!("🎥 摄像头已启动 (Gen: {})", generation);
        }
    }

    /// 发送输入框内容, 在后台线程等待回复
    pub fn send_message(&mut self) {
        let Some(text) = prepare_input(&self.input) else {
            return;
        };
        self.input.clear();
        self.transcript.push(Speaker::You, text.clone());
        self.awaiting_reply = true;

        let chat = Arc::clone(&self.chat);
        let reply_tx = self.reply_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("chat-request".to_string())
            .spawn(move || {
                let reply = chat.respond(&text);
                let _ = reply_tx.send(reply);
            });

        if let Err(e) = spawned {
            error!("❌ 请求线程启动失败: {}", e);
            self.transcript.push(Speaker::Assistant, format!("Error: {}", e));
            self.awaiting_reply = false;
            self.focus_input = true;
        }
    }

    fn take_snapshot(&mut self) {
        let Some(frame) = &self.last_frame else {
            return;
        };
        self.status = Some(match save_snapshot(&self.args.snapshot_dir(), frame) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                warn!("❌ 截图失败: {:#}", e);
                format!("Snapshot failed: {:#}", e)
            }
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.capture.stop();
        self.settings.save(&self.args.settings);
        info!(
            "👋 退出, 运行 {:.0}s, 对话 {} 条",
            self.started.elapsed().as_secs_f64(),
            self.chat.history().len()
        );
    }
}
