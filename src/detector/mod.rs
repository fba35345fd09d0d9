// 该文件是 Chejian （车检） 项目的一部分。
// src/detector/mod.rs - 检测器模块
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod postprocess;
mod ssd;

pub use postprocess::PostProcessor;
pub use ssd::SsdDetector;

use image::RgbImage;
use thiserror::Error;

/// 检测器错误
#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("无法加载模型 {path}: {source}")]
  Load {
    path: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
  #[error("输入图像为空")]
  EmptyInput,
  #[error("推理失败: {0}")]
  Inference(String),
  #[error("模型输出格式异常: {0}")]
  BadOutput(String),
}

/// 网络原始候选项
///
/// 坐标为归一化 [0,1] 的 [x_min, y_min, x_max, y_max]，
/// 未经阈值过滤、未换算到像素空间。
#[derive(Debug, Clone)]
pub struct Candidate {
  /// 类别索引
  pub class_id: usize,
  /// 置信度
  pub score: f32,
  /// 归一化边界框 [x_min, y_min, x_max, y_max]
  pub bbox: [f32; 4],
}

/// 检测结果
///
/// 边界框为像素坐标，左上角 + 宽高。
/// 每次推理生成，标注后即丢弃，不做持久化。
#[derive(Debug, Clone)]
pub struct Detection {
  /// 边界框左上角 x 坐标
  pub x: f32,
  /// 边界框左上角 y 坐标
  pub y: f32,
  /// 边界框宽度
  pub width: f32,
  /// 边界框高度
  pub height: f32,
  /// 置信度
  pub confidence: f32,
  /// 类别索引
  pub class_id: usize,
}

/// 检测器 trait
///
/// 实现者对一帧图像运行推理并返回像素空间的检测结果；
/// 调用不改变检测器自身状态，可以顺序复用。
pub trait Detector {
  fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError>;
}
