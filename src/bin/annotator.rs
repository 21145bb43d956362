// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 车位标注工具 (Zone Annotator)
///
/// 在视频第一帧上用鼠标拖出车位矩形, S 保存, Esc 放弃退出
///
/// 直接运行: cargo run --bin annotator
use anyhow::Result;
use clap::Parser;
use macroquad::prelude::*;
use smartpark_rs::annotator::{AnnotatorState, MouseEvent};
use smartpark_rs::input::first_frame;
use smartpark_rs::renderer::{draw_annotations, draw_hint, FrameTexture};
use smartpark_rs::init_logger;

/// 车位标注参数
#[derive(Parser, Debug)]
#[command(author, version, about = "鼠标标注车位", long_about = None)]
struct Args {
    /// 视频文件 (取第一帧)
    #[arg(short, long, default_value = "carPark.mov")]
    video: String,

    /// 车位定义输出文件
    #[arg(short, long, default_value = "zones.json")]
    output: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "车位标注".to_owned(),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        ..Default::default()
    }
}

fn load_background(path: &str) -> Result<FrameTexture> {
    let frame = first_frame(path)?;
    log::info!(
        "🖼️ 背景帧: {}x{}",
        frame.image.width(),
        frame.image.height()
    );
    let mut texture = FrameTexture::new();
    texture.update(&frame.image);
    Ok(texture)
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logger();
    let args = Args::parse();

    let texture = match load_background(&args.video) {
        Ok(t) => t,
        Err(e) => {
            log::error!("❌ 无法读取视频: {:#}", e);
            std::process::exit(1);
        }
    };

    log::info!("📐 按住左键拖动画出车位 | S: 保存并退出 | Esc: 放弃退出");
    let mut state = AnnotatorState::new();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            log::info!("👋 未保存退出, 放弃 {} 个车位", state.zones().len());
            break;
        }
        if is_key_pressed(KeyCode::S) {
            match state.zones().save(&args.output) {
                Ok(()) => break,
                Err(e) => log::error!("❌ 保存失败: {:#}", e),
            }
        }

        let Some(viewport) = texture.viewport() else {
            next_frame().await;
            continue;
        };

        // 窗口坐标 → 帧像素坐标
        let pos = viewport.to_frame(mouse_position());
        let events = MouseEvent::from_buttons(
            is_mouse_button_pressed(MouseButton::Left),
            is_mouse_button_down(MouseButton::Left),
            is_mouse_button_released(MouseButton::Left),
            pos,
        );
        for event in events {
            state = state.handle(event);
        }

        clear_background(BLACK);
        texture.draw(&viewport);
        draw_annotations(&viewport, state.zones(), state.dragging_rect());
        draw_hint(&format!(
            "Zones: {} | S: save | Esc: quit",
            state.zones().len()
        ));

        next_frame().await;
    }
}
