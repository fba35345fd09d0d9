// 该文件是 Chejian （车检） 项目的一部分。
// src/input/mod.rs - 输入源模块
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod image_source;
#[cfg(feature = "video")]
mod video_source;

pub use image_source::ImageSource;
#[cfg(feature = "video")]
pub use video_source::VideoSource;

use image::RgbImage;
use thiserror::Error;

/// 输入源错误
#[derive(Error, Debug)]
pub enum InputError {
  #[error("无法打开输入源 {path}: {source}")]
  Open {
    path: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
  #[error("解码帧失败: {0}")]
  Decode(String),
  #[error("不支持的输入源 {0}（视频输入需要启用 video 特性）")]
  Unsupported(String),
}

/// 帧数据
pub struct Frame {
  /// RGB 图像数据
  pub image: RgbImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

/// 输入源类型
pub enum SourceType {
  /// 图片文件
  Image,
  /// 视频文件
  Video,
}

/// 帧输入源 trait
///
/// 惰性、有限、不可重放的帧序列，读到尽头即结束；
/// 单张图片和视频流统一走这个接口。
/// 资源随 drop 释放，包括循环中途出错提前退出的情形。
pub trait FrameSource: Iterator<Item = Result<Frame, InputError>> {
  /// 获取输入源类型
  fn source_type(&self) -> SourceType;

  /// 获取帧宽度
  fn width(&self) -> u32;

  /// 获取帧高度
  fn height(&self) -> u32;

  /// 获取帧率（如果适用）
  fn fps(&self) -> Option<f64>;
}

impl std::fmt::Debug for dyn FrameSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FrameSource")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("fps", &self.fps())
      .finish()
  }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
  fn source_type(&self) -> SourceType {
    (**self).source_type()
  }

  fn width(&self) -> u32 {
    (**self).width()
  }

  fn height(&self) -> u32 {
    (**self).height()
  }

  fn fps(&self) -> Option<f64> {
    (**self).fps()
  }
}

/// 路径是否指向图片文件
fn is_image_path(path: &str) -> bool {
  let lower = path.to_lowercase();
  lower.ends_with(".jpg")
    || lower.ends_with(".jpeg")
    || lower.ends_with(".png")
    || lower.ends_with(".bmp")
    || lower.ends_with(".gif")
    || lower.ends_with(".webp")
}

/// 从路径创建帧输入源
///
/// 图片扩展名走单帧图片源，其余路径视为视频文件。
pub fn create_frame_source(path: &str) -> Result<Box<dyn FrameSource>, InputError> {
  if is_image_path(path) {
    return Ok(Box::new(ImageSource::new(path)?));
  }

  #[cfg(feature = "video")]
  {
    Ok(Box::new(VideoSource::new(path)?))
  }
  #[cfg(not(feature = "video"))]
  {
    Err(InputError::Unsupported(path.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn image_extensions_are_sniffed() {
    assert!(is_image_path("a.jpg"));
    assert!(is_image_path("a.JPEG"));
    assert!(is_image_path("dir/b.png"));
    assert!(!is_image_path("a.mp4"));
    assert!(!is_image_path("/dev/video0"));
  }

  #[test]
  fn missing_image_is_open_error() {
    let err = create_frame_source("/no/such/file.png").unwrap_err();
    assert!(matches!(err, InputError::Open { .. }));
  }

  #[cfg(not(feature = "video"))]
  #[test]
  fn video_without_feature_is_unsupported() {
    let err = create_frame_source("clip.mp4").unwrap_err();
    assert!(matches!(err, InputError::Unsupported(_)));
  }
}
