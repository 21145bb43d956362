// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频输入系统 (Video Input System)
///
/// 独立解码线程,负责视频文件解码与像素格式转换
/// - VideoReader: 按顺序读取视频帧 (有界通道背压)
/// - DecodeFilter: 帧过滤, YUV420P → RGBA
/// - sampler: 均匀抽帧保存为 JPEG
pub mod decode_filter;
pub mod decoder;
pub mod sampler;

use image::RgbaImage;

pub use decode_filter::DecodeFilter;
pub use decoder::{first_frame, VideoReader};
pub use sampler::{match_samples, sample_frames, sample_indices, SampleCursor, SampleMatch, SampleSummary};

/// 解码后的单帧
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbaImage,
    pub frame_id: u64, // 从 0 开始的帧序号
}
