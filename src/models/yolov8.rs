// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型实现
// 包含: 模型加载、预处理、推理、后处理

use anyhow::{anyhow, Result};
use fast_image_resize as fr;
use image::RgbaImage;
use ndarray::{s, Array, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::{non_max_suppression, Bbox, OrtBackend, OrtConfig, OrtEP};

/// YOLOv8 模型参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YOLOv8Config {
    pub model: String, // ONNX 权重路径
    pub ep: OrtEP,
    pub imgsz: u32,                   // 模型输入尺寸 (正方形)
    pub conf: f32,                    // 置信度阈值
    pub iou: f32,                     // NMS IOU阈值
    pub classes: Option<Vec<usize>>, // 只保留这些类别, None = 全部
    pub profile: bool,
}

impl Default for YOLOv8Config {
    fn default() -> Self {
        Self {
            model: "models/best.onnx".to_string(),
            ep: OrtEP::CPU,
            imgsz: 640,
            conf: 0.019,
            iou: 0.5,
            classes: None,
            profile: false,
        }
    }
}

/// YOLOv8 模型结构
pub struct YOLOv8 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    conf: f32,
    iou: f32,
    classes: Option<Vec<usize>>,
    profile: bool,
    resizer: fr::Resizer,
}

impl YOLOv8 {
    /// 从配置创建 YOLOv8 模型
    pub fn new(config: YOLOv8Config) -> Result<Self> {
        let ort_args = OrtConfig {
            ep: config.ep,
            f: config.model,
            image_size: (config.imgsz, config.imgsz),
        };
        let engine = OrtBackend::build(ort_args)?;
        let (height, width) = (engine.height(), engine.width());

        Ok(Self {
            engine,
            height,
            width,
            conf: config.conf,
            iou: config.iou,
            classes: config.classes,
            profile: config.profile,
            resizer: fr::Resizer::new(),
        })
    }

    fn scale_wh(&self, w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
        let r = (w1 / w0).min(h1 / h0);
        (r, (w0 * r).round(), (h0 * r).round())
    }

    pub fn conf(&self) -> f32 {
        self.conf
    }

    pub fn iou(&self) -> f32 {
        self.iou
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

// 实现统一的 Model trait
impl super::Model for YOLOv8 {
    fn preprocess(&mut self, image: &RgbaImage) -> Result<Array<f32, IxDyn>> {
        let t_pre = std::time::Instant::now();
        let (w0, h0) = image.dimensions();
        let (_, w_new, h_new) =
            self.scale_wh(w0 as f32, h0 as f32, self.width() as f32, self.height() as f32);
        let (w_new, h_new) = ((w_new as u32).max(1), (h_new as u32).max(1));

        // 等比缩放 (fast_image_resize), 放在左上角, 其余填充灰色
        let src_image =
            fr::images::Image::from_vec_u8(w0, h0, image.as_raw().clone(), fr::PixelType::U8x4)
                .map_err(|e| anyhow!("源图像创建失败: {:?}", e))?;
        let mut dst_image = fr::images::Image::new(w_new, h_new, fr::PixelType::U8x4);
        self.resizer
            .resize(
                &src_image,
                &mut dst_image,
                &fr::ResizeOptions::new()
                    .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
            )
            .map_err(|e| anyhow!("缩放失败: {:?}", e))?;

        let mut ys =
            Array::ones((1, 3, self.height() as usize, self.width() as usize)).into_dyn();
        ys.fill(144.0 / 255.0);
        for (i, rgba) in dst_image.buffer().chunks_exact(4).enumerate() {
            let x = i % w_new as usize;
            let y = i / w_new as usize;
            ys[[0, 0, y, x]] = (rgba[0] as f32) / 255.0;
            ys[[0, 1, y, x]] = (rgba[1] as f32) / 255.0;
            ys[[0, 2, y, x]] = (rgba[2] as f32) / 255.0;
        }

        if self.profile {
            log::debug!("[Model Preprocess]: {:?}", t_pre.elapsed());
        }
        Ok(ys)
    }

    fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        self.engine.run(xs, profile || self.profile)
    }

    fn postprocess(&self, xs: Vec<Array<f32, IxDyn>>, image: &RgbaImage) -> Result<Vec<Bbox>> {
        let preds = xs.first().ok_or_else(|| anyhow!("模型没有输出"))?;
        decode_detections(
            preds,
            (self.width(), self.height()),
            image.dimensions(),
            self.conf,
            self.iou,
            self.classes.as_deref(),
        )
    }

    fn summary(&self) {
        log::info!(
            "📦 Summary: EP {:?}{} | Height: {}, Width: {} | conf: {}, iou: {}, classes: {:?}",
            self.engine.ep(),
            if let OrtEP::CPU = self.engine.ep() {
                ""
            } else {
                " (May still fall back to CPU)"
            },
            self.height(),
            self.width(),
            self.conf,
            self.iou,
            self.classes,
        );
    }
}

/// 解码检测头输出 `[1, 4 + nc, anchors]` (cx, cy, w, h, 各类别分数)
///
/// 坐标还原到原图尺寸, 置信度过滤 + 类别过滤 + NMS
pub fn decode_detections(
    preds: &Array<f32, IxDyn>,
    (input_w, input_h): (u32, u32),
    (width_original, height_original): (u32, u32),
    conf: f32,
    iou: f32,
    classes: Option<&[usize]>,
) -> Result<Vec<Bbox>> {
    const CXYWH_OFFSET: usize = 4;

    if preds.ndim() != 3 || preds.shape()[1] <= CXYWH_OFFSET {
        return Err(anyhow!("不支持的输出形状: {:?}", preds.shape()));
    }
    let anchor = preds.index_axis(Axis(0), 0);

    let width_original = width_original as f32;
    let height_original = height_original as f32;
    let ratio = (input_w as f32 / width_original).min(input_h as f32 / height_original);

    let mut data: Vec<Bbox> = Vec::new();
    for pred in anchor.axis_iter(Axis(1)) {
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..]);

        let Some((id, &confidence)) = clss
            .iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        else {
            continue;
        };

        if confidence < conf {
            continue;
        }
        if let Some(classes) = classes {
            if !classes.contains(&id) {
                continue;
            }
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        // 四个角点各自裁剪到原图范围
        let x1 = (cx - w / 2.).max(0.0f32).min(width_original);
        let y1 = (cy - h / 2.).max(0.0f32).min(height_original);
        let x2 = (cx + w / 2.).max(0.0f32).min(width_original);
        let y2 = (cy + h / 2.).max(0.0f32).min(height_original);
        data.push(Bbox::new(x1, y1, x2 - x1, y2 - y1, id, confidence));
    }

    non_max_suppression(&mut data, iou);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::occupancy::is_occupied;

    /// 构造 [1, 4 + nc, anchors] 输出, 每个 anchor 一列
    fn output(anchors: &[[f32; 6]]) -> Array<f32, IxDyn> {
        let mut ys = Array::zeros((1, 6, anchors.len())).into_dyn();
        for (j, a) in anchors.iter().enumerate() {
            for (i, v) in a.iter().enumerate() {
                ys[[0, i, j]] = *v;
            }
        }
        ys
    }

    #[test]
    fn test_decode_scales_to_original() {
        // 1280x640 原图 → 640 输入, ratio = 0.5
        let preds = output(&[[100., 50., 40., 20., 0.9, 0.1]]);
        let boxes = decode_detections(&preds, (640, 640), (1280, 640), 0.25, 0.5, None).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].xmin(), 160.);
        assert_eq!(boxes[0].ymin(), 80.);
        assert_eq!(boxes[0].xmax(), 240.);
        assert_eq!(boxes[0].id(), 0);
    }

    #[test]
    fn test_decode_filters_conf_and_class() {
        let preds = output(&[
            [100., 100., 10., 10., 0.01, 0.0],
            [300., 300., 10., 10., 0.0, 0.8],
        ]);
        let boxes = decode_detections(&preds, (640, 640), (640, 640), 0.019, 0.5, None).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id(), 1);

        let boxes =
            decode_detections(&preds, (640, 640), (640, 640), 0.019, 0.5, Some(&[0])).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_decode_suppresses_duplicates() {
        let preds = output(&[
            [100., 100., 50., 50., 0.9, 0.0],
            [102., 101., 50., 50., 0.7, 0.0],
        ]);
        let boxes = decode_detections(&preds, (640, 640), (640, 640), 0.1, 0.5, None).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].confidence(), 0.9);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        let preds = Array::zeros((1, 4, 10)).into_dyn();
        assert!(decode_detections(&preds, (640, 640), (640, 640), 0.1, 0.5, None).is_err());
    }

    #[test]
    fn test_decode_clips_corners_independently() {
        // 跨左边界: cx=10, w=40 → x ∈ [-10, 30] → [0, 30]
        let preds = output(&[[10., 100., 40., 20., 0.9, 0.0]]);
        let boxes = decode_detections(&preds, (640, 640), (640, 640), 0.1, 0.5, None).unwrap();
        assert_eq!(boxes[0].xmin(), 0.);
        assert_eq!(boxes[0].xmax(), 30.);
        assert_eq!(boxes[0].rect(), Rect::new(0, 90, 30, 110));

        // 裁剪后不含车位中心 (34, 100), 车位保持空闲
        let zone = Rect::new(28, 90, 40, 110);
        assert!(!is_occupied(&zone, &[boxes[0].rect()]));
    }

    #[test]
    fn test_decode_clips_right_and_bottom() {
        let preds = output(&[[630., 635., 40., 20., 0.9, 0.0]]);
        let boxes = decode_detections(&preds, (640, 640), (640, 640), 0.1, 0.5, None).unwrap();
        assert_eq!(boxes[0].xmin(), 610.);
        assert_eq!(boxes[0].xmax(), 640.);
        assert_eq!(boxes[0].ymin(), 625.);
        assert_eq!(boxes[0].ymax(), 640.);
    }
}
