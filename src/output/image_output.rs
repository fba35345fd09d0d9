// 该文件是 Chejian （车检） 项目的一部分。
// src/output/image_output.rs - 图片输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;

use super::{OutputError, OutputWriter, Visualizer};
use crate::detector::Detection;
use crate::labels::Labels;

/// 图片输出
///
/// 把标注后的帧保存为单个图片文件；多帧输入时后写的覆盖先写的。
pub struct ImageOutput {
  /// 输出路径
  output_path: String,
  /// 可视化工具
  visualizer: Visualizer,
}

impl ImageOutput {
  /// 创建一个新的图片输出
  pub fn new(output_path: &str, visualizer: Visualizer) -> Self {
    Self {
      output_path: output_path.to_string(),
      visualizer,
    }
  }
}

impl OutputWriter for ImageOutput {
  fn write_frame(
    &mut self,
    image: &RgbImage,
    detections: &[Detection],
    labels: &Labels,
  ) -> Result<(), OutputError> {
    let mut output_image = image.clone();
    self
      .visualizer
      .draw_detections(&mut output_image, detections, labels)?;

    output_image.save(&self.output_path)?;

    Ok(())
  }

  fn finish(&mut self) -> Result<(), OutputError> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writes_annotated_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let labels = Labels::from_names(vec!["car".into()]);

    let mut output = ImageOutput::new(path.to_str().unwrap(), Visualizer::with_font(None));
    let image = RgbImage::new(10, 10);
    output.write_frame(&image, &[], &labels).unwrap();
    output.finish().unwrap();

    let written = image::open(&path).unwrap().to_rgb8();
    assert_eq!(written.dimensions(), (10, 10));
  }
}
