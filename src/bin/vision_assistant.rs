// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// Vision Assistant Pro
///
/// 摄像头目标检测 + 聊天助手
///
/// 系统架构:
/// 1. 采集线程: 摄像头解码与像素转换 (独立工作线程)
/// 2. 检测线程: DETR 检测、新目标判定、绘制检测框 (独立工作线程)
/// 3. 请求线程: 每条聊天消息一个 (阻塞 HTTP)
/// 4. 主线程:   渲染显示 (macroquad + egui)
use clap::Parser;
use macroquad::window::{next_frame, Conf};
use tracing::error;
use tracing_subscriber::EnvFilter;
use vision_assistant::app::{App, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};
use vision_assistant::Args;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn window_conf() -> Conf {
    Conf {
        window_title: WINDOW_TITLE.to_string(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut app = match App::launch(args) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ Error: {:#}", e);
            return;
        }
    };

    loop {
        app.update();
        app.draw();
        app.draw_egui();
        egui_macroquad::draw();
        next_frame().await;
    }
}
