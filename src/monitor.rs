// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 占用监控单帧流程: 检测 → 判定 → 上报

use anyhow::Result;
use image::RgbaImage;

use crate::geometry::Rect;
use crate::models::Detector;
use crate::occupancy::{self, OccupancyReport};
use crate::transport::ReportSink;
use crate::zone::ZoneSet;

/// 单帧处理结果 (供画面叠加使用)
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub detections: Vec<Rect>,
    pub report: OccupancyReport,
    pub delivered: bool, // 报告是否上报成功
}

pub struct Monitor<D, S> {
    detector: D,
    sink: S,
    zones: ZoneSet,
    frames: u64,
    failed_sends: u64,
}

impl<D: Detector, S: ReportSink> Monitor<D, S> {
    pub fn new(detector: D, sink: S, zones: ZoneSet) -> Self {
        Self {
            detector,
            sink,
            zones,
            frames: 0,
            failed_sends: 0,
        }
    }

    /// 处理一帧
    ///
    /// 检测失败返回错误; 上报失败只记录日志, 不中断
    pub fn process(&mut self, image: &RgbaImage) -> Result<FrameOutcome> {
        let detections: Vec<Rect> = self
            .detector
            .detect(image)?
            .iter()
            .map(|bbox| bbox.rect())
            .collect();

        let report = occupancy::evaluate(&self.zones, &detections);
        self.frames += 1;

        let delivered = match self.sink.send(&report) {
            Ok(()) => true,
            Err(e) => {
                self.failed_sends += 1;
                log::warn!("⚠️ 发送数据失败: {:#}", e);
                false
            }
        };

        log::info!(
            "🔴 占用: {} | 🟢 空闲: {}",
            report.occupied(),
            report.available()
        );

        Ok(FrameOutcome {
            detections,
            report,
            delivered,
        })
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failed_sends(&self) -> u64 {
        self.failed_sends
    }
}
