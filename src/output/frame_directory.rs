// 该文件是 Chejian （车检） 项目的一部分。
// src/output/frame_directory.rs - 目录逐帧输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::Utc;
use image::RgbImage;

use super::{OutputError, OutputWriter, Visualizer};
use crate::detector::Detection;
use crate::labels::Labels;

/// 检测记录文件名
const RECORD_FILE: &str = "detections.txt";

/// 目录逐帧输出
///
/// 每帧保存一张标注 PNG（按帧号编号），
/// 并把检测结果逐行追加到 `detections.txt`：
/// `帧号, 标签, 置信度, x, y, 宽, 高`。
pub struct FrameDirectoryOutput {
  /// 输出目录
  directory: PathBuf,
  /// 可视化工具
  visualizer: Visualizer,
  /// 检测记录
  record: BufWriter<File>,
  /// 帧计数
  frame_counter: u64,
}

impl FrameDirectoryOutput {
  /// 创建目录并打开检测记录文件
  pub fn new(directory: &str, visualizer: Visualizer) -> Result<Self, OutputError> {
    let directory = PathBuf::from(directory);
    std::fs::create_dir_all(&directory)?;

    let mut record = BufWriter::new(File::create(directory.join(RECORD_FILE))?);
    writeln!(record, "# 记录开始于 {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    Ok(Self {
      directory,
      visualizer,
      record,
      frame_counter: 0,
    })
  }

  fn frame_path(&self) -> PathBuf {
    self
      .directory
      .join(format!("frame-{:06}.png", self.frame_counter))
  }
}

impl OutputWriter for FrameDirectoryOutput {
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
    output_image.save(self.frame_path())?;

    for det in detections {
      let name = labels.get(det.class_id)?;
      writeln!(
        self.record,
        "{:06}, {}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
        self.frame_counter, name, det.confidence, det.x, det.y, det.width, det.height
      )?;
    }

    self.frame_counter += 1;
    Ok(())
  }

  fn finish(&mut self) -> Result<(), OutputError> {
    self.record.flush()?;
    Ok(())
  }
}
