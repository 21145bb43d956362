// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod annotator; // 鼠标标注车位
pub mod config; // 监控配置参数
pub mod geometry; // 整数像素矩形
pub mod input; // 视频输入系统
pub mod models; // 模型接口与具体实现
pub mod monitor; // 占用监控主循环
pub mod occupancy; // 车位占用判定
pub mod renderer; // macroquad 画面叠加
pub mod transport; // 占用报告上报
pub mod zone; // 车位定义文件

pub mod ort_backend;

pub use crate::config::MonitorConfig;
pub use crate::geometry::Rect;
pub use crate::models::{Bbox, Detector, Model, YOLOv8, YOLOv8Config};
pub use crate::occupancy::{OccupancyReport, ZoneStatus};
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::zone::{Zone, ZoneSet};

pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

/// 初始化日志 (默认 info, 可用 RUST_LOG 覆盖)
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
