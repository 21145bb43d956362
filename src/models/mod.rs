// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测模型接口与实现
///
/// ## Model Trait
/// 统一的模型接口,定义标准流程: preprocess → run → postprocess
///
/// ## Detector Trait
/// 监控循环只依赖 `Detector::detect`,所有 `Model` 自动实现;
/// 测试中可以直接用固定检测框的桩实现替换真实模型
///
/// ## 使用示例
/// ```ignore
/// use smartpark_rs::models::{Detector, YOLOv8, YOLOv8Config};
///
/// let mut model = YOLOv8::new(YOLOv8Config::default())?;
/// let bboxes = model.detect(&frame.image)?;
/// ```
use anyhow::Result;
use image::RgbaImage;
use ndarray::{Array, IxDyn};

use crate::geometry::Rect;

pub mod yolov8; // YOLOv8 检测模型 + 实现 Model trait

pub use yolov8::{YOLOv8, YOLOv8Config};

/// 统一的深度学习模型接口
///
/// ## 核心流程
/// ```text
/// RGBA帧 → preprocess → NCHW张量
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 → postprocess → 检测框(原图坐标)
/// ```
pub trait Model {
    /// 预处理: 帧 → NCHW 张量
    fn preprocess(&mut self, image: &RgbaImage) -> Result<Array<f32, IxDyn>>;

    /// 推理: 执行模型前向传播
    fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>>;

    /// 后处理: 原始输出 → 检测框
    ///
    /// # Arguments
    /// * `xs` - 模型原始输出
    /// * `image` - 原始帧(用于坐标还原)
    fn postprocess(&self, xs: Vec<Array<f32, IxDyn>>, image: &RgbaImage) -> Result<Vec<Bbox>>;

    /// 完整的推理流程: preprocess → run → postprocess
    fn forward(&mut self, image: &RgbaImage) -> Result<Vec<Bbox>> {
        let xs = self.preprocess(image)?;
        let ys = self.run(xs, false)?;
        self.postprocess(ys, image)
    }

    /// 打印模型信息
    fn summary(&self);
}

/// 单帧检测能力 (监控循环的依赖边界)
pub trait Detector {
    fn detect(&mut self, image: &RgbaImage) -> Result<Vec<Bbox>>;
}

impl<M: Model> Detector for M {
    fn detect(&mut self, image: &RgbaImage) -> Result<Vec<Bbox>> {
        self.forward(image)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    // a bounding box around an object
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new_from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            xmin: x1,
            ymin: y1,
            width: x2 - x1,
            height: y2 - y1,
            ..Default::default()
        }
    }

    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// 整数像素框, 角点坐标向零截断
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.xmin() as i32,
            self.ymin() as i32,
            self.xmax() as i32,
            self.ymax() as i32,
        )
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = (self.xmin + self.width).min(another.xmin + another.width);
        let t = self.ymin.max(another.ymin);
        let b = (self.ymin + self.height).min(another.ymin + another.height);
        (r - l + 1.).max(0.) * (b - t + 1.).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        self.intersection_area(another) / self.union(another)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_truncates() {
        let bbox = Bbox::new(10.9, 20.2, 30.5, 40.99, 0, 0.9);
        assert_eq!(bbox.rect(), Rect::new(10, 20, 41, 61));
    }

    #[test]
    fn test_iou_identical() {
        let a = Bbox::new_from_xyxy(0., 0., 10., 10.);
        assert!(a.iou(&a) > 0.99);
        let b = Bbox::new_from_xyxy(100., 100., 110., 110.);
        assert_eq!(a.iou(&b), 0.0);
    }
}
