// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理引擎封装

use anyhow::{anyhow, Context, Result};
use ndarray::{Array, IxDyn};
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};

/// 执行后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrtEP {
    #[default]
    CPU,
    CUDA(i32),
    Trt(i32),
}

/// 引擎构建参数
#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
    /// (height, width)
    pub image_size: (u32, u32),
}

pub struct OrtBackend {
    session: Session,
    input_name: String,
    ep: OrtEP,
    height: u32,
    width: u32,
}

impl OrtBackend {
    pub fn build(args: OrtConfig) -> Result<Self> {
        let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

        // 非CPU后端注册失败时 ort 会自动回退到CPU
        let builder = match args.ep {
            OrtEP::CPU => builder,
            OrtEP::CUDA(device_id) => builder.with_execution_providers([
                CUDAExecutionProvider::default().with_device_id(device_id).build(),
            ])?,
            OrtEP::Trt(device_id) => builder.with_execution_providers([
                TensorRTExecutionProvider::default().with_device_id(device_id).build(),
                CUDAExecutionProvider::default().with_device_id(device_id).build(),
            ])?,
        };

        let session = builder
            .commit_from_file(&args.f)
            .with_context(|| format!("模型加载失败: {}", args.f))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| anyhow!("模型没有输入节点: {}", args.f))?;

        let (height, width) = args.image_size;
        Ok(Self {
            session,
            input_name,
            ep: args.ep,
            height,
            width,
        })
    }

    /// 执行一次前向推理, 输入为 NCHW 张量
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();

        let shape = xs.shape().to_vec();
        let (data, _) = xs.into_raw_vec_and_offset();
        let input = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        let (dims, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
        let y = Array::from_shape_vec(IxDyn(&dims), data.to_vec())?;

        if profile {
            log::debug!("[ORT H2D + Inference + D2H]: {:?}", t.elapsed());
        }

        Ok(vec![y])
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}
