// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频文件解码器
/// 解码在独立线程中进行, 帧通过有界通道交给调用方
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};

use super::decode_filter::DecodeFilter;
use super::DecodedFrame;

/// 解码通道容量 (处理端慢时解码线程阻塞)
const FRAME_QUEUE_CAP: usize = 2;

pub struct VideoReader {
    path: String,
    frames: Receiver<DecodedFrame>,
    handle: Option<JoinHandle<()>>,
}

impl VideoReader {
    /// 打开视频文件并启动解码线程
    ///
    /// 文件无法打开或解码器无法启动时返回错误
    pub fn open(path: &str) -> Result<Self> {
        let (frame_tx, frame_rx) = bounded::<DecodedFrame>(FRAME_QUEUE_CAP);
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let url = path.to_string();

        let handle = std::thread::Builder::new()
            .name("decoder".to_string())
            .spawn(move || {
                let filter = DecodeFilter::new(frame_tx);
                let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
                let pipe = pipe.filter("decode", Box::new(filter));
                let out = create_null_output().add_frame_pipeline(pipe);

                let ctx = match FfmpegContext::builder()
                    .input(Input::new(url.as_str()))
                    .filter_descs(["format=yuv420p"].into())
                    .output(out)
                    .build()
                {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("构建失败: {}", e)));
                        return;
                    }
                };

                let sch = match ctx.start() {
                    Ok(sch) => sch,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("启动失败: {}", e)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // 接收端关闭时过滤器返回错误, 这里只记录
                if let Err(e) = sch.wait() {
                    log::debug!("解码结束: {}", e);
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("🎬 视频已打开: {}", path);
                Ok(Self {
                    path: path.to_string(),
                    frames: frame_rx,
                    handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(anyhow!("无法打开视频 {}: {}", path, e))
            }
            Err(_) => {
                let _ = handle.join();
                Err(anyhow!("无法打开视频 {}: 解码线程异常退出", path))
            }
        }
    }

    /// 下一帧, 视频结束返回 None
    pub fn next_frame(&mut self) -> Option<DecodedFrame> {
        self.frames.recv().ok()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Iterator for VideoReader {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        // 先断开通道让解码线程退出, 再等待
        let (_, rx) = bounded(0);
        drop(std::mem::replace(&mut self.frames, rx));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 读取视频第一帧 (标注工具的背景)
pub fn first_frame(path: &str) -> Result<DecodedFrame> {
    let mut reader = VideoReader::open(path)?;
    reader
        .next_frame()
        .ok_or_else(|| anyhow!("视频没有可读取的帧: {}", path))
}
