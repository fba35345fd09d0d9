// 该文件是 Chejian （车检） 项目的一部分。
// src/output/mod.rs - 输出模块
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod frame_directory;
mod image_output;
mod visualizer;

pub use frame_directory::FrameDirectoryOutput;
pub use image_output::ImageOutput;
pub use visualizer::{Visualizer, label_text};

use image::RgbImage;
use thiserror::Error;

use crate::detector::Detection;
use crate::labels::{LabelError, Labels};

/// 输出错误
#[derive(Error, Debug)]
pub enum OutputError {
  #[error("标签错误: {0}")]
  Label(#[from] LabelError),
  #[error("图像错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("无法加载字体 {path}: {reason}")]
  Font { path: String, reason: String },
}

/// 输出写入器 trait
pub trait OutputWriter {
  /// 写入一帧及其检测结果
  fn write_frame(
    &mut self,
    image: &RgbImage,
    detections: &[Detection],
    labels: &Labels,
  ) -> Result<(), OutputError>;

  /// 完成写入
  fn finish(&mut self) -> Result<(), OutputError>;
}

/// 创建输出写入器
///
/// 图片扩展名写单张标注图片，其余路径视为目录，
/// 逐帧落盘标注图片和检测记录。
pub fn create_output_writer(
  output_path: &str,
  visualizer: Visualizer,
) -> Result<Box<dyn OutputWriter>, OutputError> {
  let lower = output_path.to_lowercase();

  if lower.ends_with(".jpg")
    || lower.ends_with(".jpeg")
    || lower.ends_with(".png")
    || lower.ends_with(".bmp")
  {
    Ok(Box::new(ImageOutput::new(output_path, visualizer)))
  } else {
    Ok(Box::new(FrameDirectoryOutput::new(output_path, visualizer)?))
  }
}
