// 该文件是 Chejian （车检） 项目的一部分。
// src/detector/ssd.rs - SSD 车辆检测器
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use rten::{Model, NodeId};
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};

use super::{Candidate, Detection, Detector, DetectorError, PostProcessor};

/// 网络输入边长
const INPUT_SIZE: u32 = 300;
/// 像素缩放因子（约 1/127.5）
const INPUT_SCALE: f32 = 0.007843;
/// 每通道均值
const INPUT_MEAN: f32 = 127.5;
/// 输出行宽度: [_, class_id, score, x_min, y_min, x_max, y_max]
const ROW_LEN: usize = 7;

/// SSD 车辆检测器
///
/// 包装一个预训练的单阶段检测网络，推理由 rten 运行时执行。
/// 网络、后处理参数在构造后均为只读，可顺序复用，
/// 但未考虑多线程并发调用。
#[derive(Debug)]
pub struct SsdDetector {
  /// rten 模型
  model: Model,
  /// 输入节点
  input_id: NodeId,
  /// 输出节点
  output_id: NodeId,
  /// 后处理器
  post: PostProcessor,
}

impl SsdDetector {
  /// 加载模型并创建检测器
  ///
  /// 模型文件缺失或损坏在这里立刻失败，不做重试。
  pub fn new(model_path: &str, post: PostProcessor) -> Result<Self, DetectorError> {
    let model = Model::load_file(model_path).map_err(|source| DetectorError::Load {
      path: model_path.to_string(),
      source: Box::new(source),
    })?;

    let input_id = *model
      .input_ids()
      .first()
      .ok_or_else(|| DetectorError::BadOutput("模型没有输入节点".to_string()))?;
    let output_id = *model
      .output_ids()
      .first()
      .ok_or_else(|| DetectorError::BadOutput("模型没有输出节点".to_string()))?;

    Ok(Self {
      model,
      input_id,
      output_id,
      post,
    })
  }

  /// 网络输出节点名称
  pub fn output_names(&self) -> Vec<String> {
    self
      .model
      .output_ids()
      .iter()
      .filter_map(|id| self.model.node_info(*id))
      .filter_map(|info| info.name().map(str::to_string))
      .collect()
  }

  /// 预处理：缩放到网络输入尺寸并归一化为 NCHW f32 张量
  fn preprocess(&self, image: &RgbImage) -> NdTensor<f32, 4> {
    let resized = image::imageops::resize(
      image,
      INPUT_SIZE,
      INPUT_SIZE,
      image::imageops::FilterType::Triangle,
    );

    let size = INPUT_SIZE as usize;
    let mut blob = NdTensor::zeros([1, 3, size, size]);
    for (x, y, pixel) in resized.enumerate_pixels() {
      for channel in 0..3 {
        blob[[0, channel, y as usize, x as usize]] =
          (pixel[channel] as f32 - INPUT_MEAN) * INPUT_SCALE;
      }
    }

    blob
  }
}

impl Detector for SsdDetector {
  /// 对一帧图像运行前向推理
  ///
  /// 空图像立刻失败；该错误只影响本次调用，
  /// 调用方可以跳过该帧继续处理。
  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
    if image.width() == 0 || image.height() == 0 {
      return Err(DetectorError::EmptyInput);
    }

    let blob = self.preprocess(image);

    let outputs = self
      .model
      .run(vec![(self.input_id, blob.view().into())], &[self.output_id], None)
      .map_err(|e| DetectorError::Inference(e.to_string()))?;

    let output = outputs
      .into_iter()
      .next()
      .ok_or_else(|| DetectorError::BadOutput("前向传播没有产生输出".to_string()))?;
    let output: Tensor<f32> = output
      .try_into()
      .map_err(|_| DetectorError::BadOutput("输出不是 f32 张量".to_string()))?;

    let candidates = decode_rows(&output.to_vec())?;

    Ok(
      self
        .post
        .process(&candidates, image.width(), image.height()),
    )
  }
}

/// 解码网络输出行
///
/// 每行编码为 [_, class_id, score, x_min, y_min, x_max, y_max]，
/// 坐标为归一化 [0,1]。阈值过滤交给后处理器。
fn decode_rows(data: &[f32]) -> Result<Vec<Candidate>, DetectorError> {
  if data.len() % ROW_LEN != 0 {
    return Err(DetectorError::BadOutput(format!(
      "输出长度 {} 不是行宽 {} 的整数倍",
      data.len(),
      ROW_LEN
    )));
  }

  let candidates = data
    .chunks_exact(ROW_LEN)
    .map(|row| Candidate {
      class_id: row[1] as usize,
      score: row[2],
      bbox: [row[3], row[4], row[5], row[6]],
    })
    .collect();

  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_rows_splits_rows() {
    let data = vec![
      0.0, 7.0, 0.9, 0.1, 0.2, 0.3, 0.4, //
      0.0, 2.0, 0.3, 0.5, 0.5, 0.9, 0.8,
    ];

    let candidates = decode_rows(&data).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].class_id, 7);
    assert_eq!(candidates[0].score, 0.9);
    assert_eq!(candidates[0].bbox, [0.1, 0.2, 0.3, 0.4]);
    assert_eq!(candidates[1].class_id, 2);
  }

  #[test]
  fn decode_rows_rejects_ragged_output() {
    let data = vec![0.0, 1.0, 0.5];
    assert!(matches!(
      decode_rows(&data),
      Err(DetectorError::BadOutput(_))
    ));
  }

  #[test]
  fn missing_model_fails_at_construction() {
    let err = SsdDetector::new("/no/such/model.rten", PostProcessor::new(0.5)).unwrap_err();
    assert!(matches!(err, DetectorError::Load { .. }));
  }
}
