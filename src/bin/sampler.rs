// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频抽帧 (Frame Sampler)
///
/// 均匀抽取 N 帧保存为 JPEG, 用于标注/训练
///
/// 直接运行: cargo run --bin sampler -- --video carPark.mov
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use smartpark_rs::init_logger;
use smartpark_rs::input::sample_frames;

/// 抽帧参数
#[derive(Parser, Debug)]
#[command(author, version, about = "视频均匀抽帧", long_about = None)]
struct Args {
    /// 视频文件
    #[arg(short, long, default_value = "carPark.mov")]
    video: String,

    /// 抽取帧数
    #[arg(short = 'n', long, default_value_t = 50)]
    count: u32,

    /// 输出目录
    #[arg(short, long, default_value = "frames_rf")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    log::info!("🎬 视频: {} | 抽取 {} 帧 → {}", args.video, args.count, args.output.display());
    let summary = sample_frames(&args.video, args.count, &args.output)?;
    if summary.saved.is_empty() {
        log::warn!("⚠️ 没有保存任何帧");
    }
    Ok(())
}
