// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 均匀抽帧: 从视频中取 N 帧保存为 JPEG (用于标注/训练集)
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ez_ffmpeg::stream_info::{find_video_stream_info, StreamInfo};
use image::DynamicImage;

use super::decoder::VideoReader;

/// 抽帧结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub total_frames: u64,
    pub saved: Vec<PathBuf>,
    pub failed: Vec<u64>, // 未能读取或保存的帧序号
}

/// 抽帧位置: i * (total / count), i ∈ [0, count)
///
/// total < count 时步长为 0, 所有位置都是第 0 帧
pub fn sample_indices(total: u64, count: u32) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    let stride = total / count as u64;
    (0..count as u64).map(|i| i * stride).collect()
}

/// 第 i 个样本 (从 0 开始) 的文件名
pub fn frame_file_name(i: usize) -> String {
    format!("frame_{:03}.jpg", i + 1)
}

/// 按帧序号顺序匹配抽帧位置
///
/// 解码端丢弃的帧不会出现在序号流中, 越过的位置记为缺失
#[derive(Debug)]
pub struct SampleCursor<'a> {
    indices: &'a [u64],
    next: usize,
}

impl<'a> SampleCursor<'a> {
    pub fn new(indices: &'a [u64]) -> Self {
        Self { indices, next: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.indices.len()
    }

    /// 送入一帧的序号, 返回 (已越过的缺失位置, 命中的样本下标)
    pub fn advance(&mut self, frame_id: u64) -> (Vec<u64>, Range<usize>) {
        let mut missed = Vec::new();
        while self.next < self.indices.len() && self.indices[self.next] < frame_id {
            missed.push(self.indices[self.next]);
            self.next += 1;
        }
        let start = self.next;
        while self.next < self.indices.len() && self.indices[self.next] == frame_id {
            self.next += 1;
        }
        (missed, start..self.next)
    }

    /// 尚未匹配的位置
    pub fn remaining(&self) -> &'a [u64] {
        &self.indices[self.next..]
    }
}

/// 匹配结果: 命中的 (样本下标, 帧序号) 与缺失的帧序号
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleMatch {
    pub hits: Vec<(usize, u64)>,
    pub missed: Vec<u64>,
}

/// 在帧序号流上匹配全部抽帧位置
pub fn match_samples(indices: &[u64], frame_ids: impl IntoIterator<Item = u64>) -> SampleMatch {
    let mut cursor = SampleCursor::new(indices);
    let mut result = SampleMatch::default();
    for frame_id in frame_ids {
        if cursor.is_done() {
            break;
        }
        let (missed, hits) = cursor.advance(frame_id);
        result.missed.extend(missed);
        result.hits.extend(hits.map(|i| (i, frame_id)));
    }
    result.missed.extend_from_slice(cursor.remaining());
    result
}

/// 视频总帧数: 优先读容器元数据, 没有时逐帧计数
pub fn frame_count(path: &str) -> Result<u64> {
    match find_video_stream_info(path) {
        Ok(Some(StreamInfo::Video { nb_frames, .. })) if nb_frames > 0 => {
            return Ok(nb_frames as u64);
        }
        Ok(_) => log::warn!("⚠️ 容器未记录帧数, 逐帧计数: {}", path),
        Err(e) => log::warn!("⚠️ 读取流信息失败 ({}), 逐帧计数: {}", e, path),
    }
    let reader = VideoReader::open(path)?;
    Ok(reader.count() as u64)
}

/// 从视频中均匀抽取 `count` 帧, 保存到 `out_dir/frame_NNN.jpg`
///
/// 单帧读取或写入失败只记录警告, 不中断其余帧
pub fn sample_frames(path: &str, count: u32, out_dir: &Path) -> Result<SampleSummary> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("无法创建输出目录: {}", out_dir.display()))?;

    let total_frames = frame_count(path)?;
    if total_frames == 0 {
        return Err(anyhow!("视频没有可读取的帧: {}", path));
    }
    let indices = sample_indices(total_frames, count);
    log::info!(
        "🎞️ 总帧数 {} | 抽取 {} 帧 | 步长 {}",
        total_frames,
        indices.len(),
        total_frames / count.max(1) as u64
    );

    let mut summary = SampleSummary {
        total_frames,
        ..Default::default()
    };
    let mut reader = VideoReader::open(path)?;
    let mut cursor = SampleCursor::new(&indices);

    while !cursor.is_done() {
        let Some(frame) = reader.next_frame() else {
            break;
        };
        let (missed, hits) = cursor.advance(frame.frame_id);
        for index in missed {
            log::warn!("⚠️ 无法读取第 {} 帧, 已跳过", index);
            summary.failed.push(index);
        }
        if hits.is_empty() {
            continue;
        }
        // 步长为 0 时同一帧对应多个样本
        let rgb = DynamicImage::ImageRgba8(frame.image).into_rgb8();
        for i in hits {
            let file = out_dir.join(frame_file_name(i));
            match rgb.save(&file) {
                Ok(()) => {
                    log::info!("💾 已保存: {}", file.display());
                    summary.saved.push(file);
                }
                Err(e) => {
                    log::warn!("⚠️ 保存第 {} 帧失败: {}", frame.frame_id, e);
                    summary.failed.push(frame.frame_id);
                }
            }
        }
    }

    for &index in cursor.remaining() {
        log::warn!("⚠️ 无法读取第 {} 帧, 已跳过", index);
        summary.failed.push(index);
    }

    log::info!(
        "✅ 抽帧完成: 保存 {} 张, 失败 {} 张 → {}",
        summary.saved.len(),
        summary.failed.len(),
        out_dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_evenly_spaced() {
        let idx = sample_indices(1000, 50);
        assert_eq!(idx.len(), 50);
        assert_eq!(idx[0], 0);
        assert_eq!(idx[1], 20);
        assert_eq!(idx[49], 980);
    }

    #[test]
    fn test_indices_truncating_stride() {
        assert_eq!(sample_indices(103, 10)[9], 90);
    }

    #[test]
    fn test_indices_fewer_frames_than_count() {
        let idx = sample_indices(10, 50);
        assert_eq!(idx.len(), 50);
        assert!(idx.iter().all(|&i| i == 0));
    }

    #[test]
    fn test_indices_zero_count() {
        assert!(sample_indices(100, 0).is_empty());
    }

    #[test]
    fn test_file_names_one_based() {
        assert_eq!(frame_file_name(0), "frame_001.jpg");
        assert_eq!(frame_file_name(49), "frame_050.jpg");
        assert_eq!(frame_file_name(999), "frame_1000.jpg");
    }

    #[test]
    fn test_dropped_frame_skips_only_its_sample() {
        let indices = sample_indices(100, 5); // [0, 20, 40, 60, 80]
        let frame_ids = (0..100).filter(|&id| id != 20);
        let m = match_samples(&indices, frame_ids);
        assert_eq!(m.missed, vec![20]);
        assert_eq!(m.hits, vec![(0, 0), (2, 40), (3, 60), (4, 80)]);
    }

    #[test]
    fn test_short_stream_reports_tail() {
        let indices = sample_indices(100, 5);
        let m = match_samples(&indices, 0..50);
        assert_eq!(m.hits, vec![(0, 0), (1, 20), (2, 40)]);
        assert_eq!(m.missed, vec![60, 80]);
    }

    #[test]
    fn test_zero_stride_hits_first_frame_repeatedly() {
        let indices = sample_indices(3, 4);
        let m = match_samples(&indices, 0..3);
        assert_eq!(m.hits, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert!(m.missed.is_empty());
    }

    #[test]
    fn test_cursor_advance() {
        let indices = [0, 10, 20];
        let mut cursor = SampleCursor::new(&indices);
        assert_eq!(cursor.advance(0), (vec![], 0..1));
        assert_eq!(cursor.advance(5), (vec![], 1..1));
        assert_eq!(cursor.advance(15), (vec![10], 2..2));
        assert_eq!(cursor.remaining(), &[20]);
        assert!(!cursor.is_done());
        assert_eq!(cursor.advance(20), (vec![], 2..3));
        assert!(cursor.is_done());
    }
}
