// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// FFmpeg解码过滤器: 视频文件 → RGBA帧 → 有界通道
use std::time::Instant;

use crossbeam_channel::Sender;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use image::RgbaImage;

use super::DecodedFrame;

pub struct DecodeFilter {
    tx: Sender<DecodedFrame>,
    pub count: usize,
    pub last: Instant,
    pub current_fps: f64,
    pub dropped_frames: usize, // 丢弃的帧数
    pub total_frames: u64,     // 总帧数 (含丢弃), 用作帧序号
}

impl DecodeFilter {
    pub fn new(tx: Sender<DecodedFrame>) -> Self {
        Self {
            tx,
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
            dropped_frames: 0,
            total_frames: 0,
        }
    }
}

impl FrameFilter for DecodeFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        log::debug!("✅ 解码线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        let frame_id = self.total_frames;
        self.total_frames += 1;

        let image = unsafe {
            // 基本检查：空帧或损坏帧
            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.dropped_frames += 1;
                log::error!("❌ 读取第 {} 帧失败: 空帧/损坏帧", frame_id);
                return Ok(None);
            }

            let w = (*frame.as_ptr()).width as u32;
            let h = (*frame.as_ptr()).height as u32;
            if w == 0 || h == 0 {
                self.dropped_frames += 1;
                log::error!("❌ 读取第 {} 帧失败: 非法分辨率 {}x{}", frame_id, w, h);
                return Ok(None);
            }

            // YUV420P数据指针 (ffmpeg 端已用 format=yuv420p 统一像素格式)
            let y_plane = (*frame.as_ptr()).data[0];
            let u_plane = (*frame.as_ptr()).data[1];
            let v_plane = (*frame.as_ptr()).data[2];
            let y_stride = (*frame.as_ptr()).linesize[0] as usize;
            let uv_stride = (*frame.as_ptr()).linesize[1] as usize;

            if y_plane.is_null() || u_plane.is_null() || v_plane.is_null() {
                self.dropped_frames += 1;
                log::error!("❌ 读取第 {} 帧失败: YUV指针为空", frame_id);
                return Ok(None);
            }
            if y_stride < w as usize || uv_stride < (w as usize).div_ceil(2) {
                self.dropped_frames += 1;
                log::error!(
                    "❌ 读取第 {} 帧失败: 步长异常 y_stride={} uv_stride={}",
                    frame_id,
                    y_stride,
                    uv_stride
                );
                return Ok(None);
            }

            let mut buffer = vec![255u8; (w * h * 4) as usize];
            yuv420p_to_rgba_scalar(
                y_plane,
                u_plane,
                v_plane,
                y_stride,
                uv_stride,
                &mut buffer,
                w as usize,
                h as usize,
            );
            match RgbaImage::from_raw(w, h, buffer) {
                Some(img) => img,
                None => {
                    self.dropped_frames += 1;
                    log::error!("❌ 读取第 {} 帧失败: RGBA图像转换失败", frame_id);
                    return Ok(None);
                }
            }
        };

        // 计算FPS
        self.count += 1;
        if self.last.elapsed().as_secs_f64() >= 1.0 {
            self.current_fps = self.count as f64 / self.last.elapsed().as_secs_f64();
            log::debug!(
                "📺 解码统计: {:.1}fps | 总帧{} | 丢弃{}",
                self.current_fps,
                self.total_frames,
                self.dropped_frames
            );
            self.last = Instant::now();
            self.count = 0;
        }

        // 阻塞发送: 处理端跟不上时解码暂停; 接收端已关闭则终止解码
        self.tx
            .send(DecodedFrame { image, frame_id })
            .map_err(|_| "frame receiver closed".to_string())?;

        Ok(Some(frame))
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        log::debug!(
            "✅ 解码线程退出 (总帧{} | 丢弃{})",
            self.total_frames,
            self.dropped_frames
        );
    }
}

/// 标量版本YUV转换
#[inline]
#[allow(clippy::too_many_arguments)]
unsafe fn yuv420p_to_rgba_scalar(
    y_plane: *const u8,
    u_plane: *const u8,
    v_plane: *const u8,
    y_stride: usize,
    uv_stride: usize,
    buffer: &mut [u8],
    width: usize,
    height: usize,
) {
    let mut out_idx = 0;
    for y in 0..height {
        let y_row = y * y_stride;
        let uv_row = (y >> 1) * uv_stride;

        for x in 0..width {
            let y_val = *y_plane.add(y_row + x) as i32;
            let u_val = *u_plane.add(uv_row + (x >> 1)) as i32 - 128;
            let v_val = *v_plane.add(uv_row + (x >> 1)) as i32 - 128;

            buffer[out_idx] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 1] =
                (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            buffer[out_idx + 2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
            out_idx += 4;
        }
    }
}
