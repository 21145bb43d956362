// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 车位占用监控 (Occupancy Monitor)
///
/// 逐帧检测车辆 → 判定每个车位是否占用 → HTTP 上报 → 画面叠加
///
/// 直接运行: cargo run --bin monitor --release
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use macroquad::prelude::*;
use smartpark_rs::input::VideoReader;
use smartpark_rs::monitor::{FrameOutcome, Monitor};
use smartpark_rs::renderer::{draw_hint, draw_overlay, FrameTexture};
use smartpark_rs::transport::HttpReporter;
use smartpark_rs::{init_logger, Model, MonitorConfig, OrtEP, YOLOv8, ZoneSet};

/// 车位占用监控参数 (未指定的项使用配置文件)
#[derive(Parser, Debug)]
#[command(author, version, about = "车位占用监控", long_about = None)]
struct Args {
    /// 配置文件
    #[arg(short, long, default_value = "monitor_config.json")]
    config: String,

    /// 视频文件
    #[arg(short, long)]
    video: Option<String>,

    /// 车位定义文件
    #[arg(short, long)]
    zones: Option<String>,

    /// ONNX 模型
    #[arg(short, long)]
    model: Option<String>,

    /// 占用报告接收地址
    #[arg(short, long)]
    endpoint: Option<String>,

    /// 置信度阈值
    #[arg(long)]
    conf: Option<f32>,

    /// NMS IOU阈值
    #[arg(long)]
    iou: Option<f32>,

    /// 使用 CUDA 设备
    #[arg(long)]
    cuda: Option<i32>,
}

impl Args {
    fn apply(self, config: &mut MonitorConfig) {
        if let Some(v) = self.video {
            config.video = v;
        }
        if let Some(v) = self.zones {
            config.zones = v;
        }
        if let Some(v) = self.model {
            config.detector.model = v;
        }
        if let Some(v) = self.endpoint {
            config.endpoint = v;
        }
        if let Some(v) = self.conf {
            config.detector.conf = v;
        }
        if let Some(v) = self.iou {
            config.detector.iou = v;
        }
        if let Some(id) = self.cuda {
            config.detector.ep = OrtEP::CUDA(id);
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "车位占用监控".to_owned(),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        ..Default::default()
    }
}

struct App {
    reader: VideoReader,
    monitor: Monitor<YOLOv8, HttpReporter>,
    frame_delay: std::time::Duration,
}

fn setup() -> Result<App> {
    let args = Args::parse();
    let mut config = MonitorConfig::load(&args.config)?;
    args.apply(&mut config);
    config.print_summary();

    let reader = VideoReader::open(&config.video)?;
    let zones = ZoneSet::load(&config.zones, &config.excluded_zones)?;
    let model = YOLOv8::new(config.detector.clone())?;
    model.summary();
    let reporter = HttpReporter::new(config.endpoint.clone(), config.http_timeout());

    Ok(App {
        reader,
        monitor: Monitor::new(model, reporter, zones),
        frame_delay: config.frame_delay(),
    })
}

#[macroquad::main(window_conf)]
async fn main() {
    init_logger();

    let mut app = match setup() {
        Ok(app) => app,
        Err(e) => {
            log::error!("❌ 启动失败: {:#}", e);
            std::process::exit(1);
        }
    };

    let mut texture = FrameTexture::new();
    let mut outcome = FrameOutcome::default();
    let mut last: Option<Instant> = None;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            log::info!("👋 用户退出");
            break;
        }

        // 按帧间隔取下一帧, 其余时间只重绘
        if last.map_or(true, |t| t.elapsed() >= app.frame_delay) {
            last = Some(Instant::now());
            let Some(frame) = app.reader.next_frame() else {
                log::info!("✅ 视频播放结束");
                break;
            };
            // 只有上报失败可恢复, 检测失败直接退出
            match app.monitor.process(&frame.image) {
                Ok(o) => outcome = o,
                Err(e) => {
                    log::error!("❌ 第 {} 帧检测失败: {:#}", frame.frame_id, e);
                    std::process::exit(1);
                }
            }
            texture.update(&frame.image);
        }

        clear_background(BLACK);
        if let Some(viewport) = texture.viewport() {
            texture.draw(&viewport);
            draw_overlay(
                &viewport,
                app.monitor.zones(),
                &outcome.report,
                &outcome.detections,
            );
        }
        draw_hint(&format!(
            "Occupied: {} | Available: {} | Esc: quit",
            outcome.report.occupied(),
            outcome.report.available()
        ));

        next_frame().await;
    }

    log::info!(
        "📊 共处理 {} 帧, 上报失败 {} 次",
        app.monitor.frames(),
        app.monitor.failed_sends()
    );
}
