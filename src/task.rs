// 该文件是 Chejian （车检） 项目的一部分。
// src/task.rs - 逐帧处理任务
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use tracing::{debug, info, warn};

use crate::detector::Detector;
use crate::input::FrameSource;
use crate::labels::Labels;
use crate::output::{OutputError, OutputWriter};

/// 任务统计
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
  /// 处理的帧数
  pub frames: u64,
  /// 检测总数
  pub detections: usize,
  /// 因推理失败跳过的帧数
  pub skipped: u64,
}

/// 逐帧处理任务
///
/// 打开的输入源顺序拉帧，每帧依次走 推理 -> 后处理 -> 标注输出，
/// 读到尽头或达到帧数上限后结束，输入源随返回被释放。
/// 单线程阻塞执行，没有取消机制。
///
/// 错误策略：单帧推理失败记日志后跳过；输入源自身损坏则终止循环；
/// 输出失败（含标签查找失败）视为配置错误，立即向上传播。
pub fn run_pipeline<S, D>(
  mut source: S,
  detector: &D,
  labels: &Labels,
  writer: &mut dyn OutputWriter,
  max_frames: u64,
) -> Result<PipelineStats, OutputError>
where
  S: FrameSource,
  D: Detector + ?Sized,
{
  let mut stats = PipelineStats::default();

  while let Some(frame_result) = source.next() {
    if max_frames > 0 && stats.frames >= max_frames {
      info!("已达到最大帧数限制: {}", max_frames);
      break;
    }

    let frame = match frame_result {
      Ok(frame) => frame,
      Err(e) => {
        // 输入源损坏，结束读取
        warn!("输入源出错，停止读取: {}", e);
        break;
      }
    };

    let now = std::time::Instant::now();
    let detections = match detector.detect(&frame.image) {
      Ok(detections) => detections,
      Err(e) => {
        warn!("帧 {} 推理失败，跳过: {}", frame.index, e);
        stats.skipped += 1;
        continue;
      }
    };
    debug!(
      "帧 {} (时间: {}ms): 检测到 {} 个对象，耗时 {:.2?}",
      frame.index,
      frame.timestamp_ms,
      detections.len(),
      now.elapsed()
    );

    writer.write_frame(&frame.image, &detections, labels)?;

    stats.frames += 1;
    stats.detections += detections.len();
  }

  writer.finish()?;

  Ok(stats)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use image::RgbImage;

  use super::*;
  use crate::detector::{Detection, DetectorError};
  use crate::input::{Frame, InputError, SourceType};

  /// 产出固定帧数的桩输入源，drop 时计数
  struct StubSource {
    remaining: u64,
    next_index: u64,
    drops: Arc<AtomicUsize>,
  }

  impl StubSource {
    fn new(frames: u64, drops: Arc<AtomicUsize>) -> Self {
      Self {
        remaining: frames,
        next_index: 0,
        drops,
      }
    }
  }

  impl Drop for StubSource {
    fn drop(&mut self) {
      self.drops.fetch_add(1, Ordering::SeqCst);
    }
  }

  impl Iterator for StubSource {
    type Item = Result<Frame, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
      if self.remaining == 0 {
        return None;
      }
      self.remaining -= 1;
      let index = self.next_index;
      self.next_index += 1;
      Some(Ok(Frame {
        image: RgbImage::new(16, 16),
        index,
        timestamp_ms: index * 40,
      }))
    }
  }

  impl FrameSource for StubSource {
    fn source_type(&self) -> SourceType {
      SourceType::Video
    }

    fn width(&self) -> u32 {
      16
    }

    fn height(&self) -> u32 {
      16
    }

    fn fps(&self) -> Option<f64> {
      Some(25.0)
    }
  }

  /// 每帧返回固定检测结果的桩检测器
  struct StubDetector {
    per_frame: Vec<Detection>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
  }

  impl StubDetector {
    fn new(per_frame: Vec<Detection>) -> Self {
      Self {
        per_frame,
        calls: AtomicUsize::new(0),
        fail_on_call: None,
      }
    }
  }

  impl Detector for StubDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
      let call = self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_on_call == Some(call) {
        return Err(DetectorError::EmptyInput);
      }
      Ok(self.per_frame.clone())
    }
  }

  /// 记录调用次数的桩输出
  #[derive(Default)]
  struct StubWriter {
    frames: usize,
    finishes: usize,
  }

  impl OutputWriter for StubWriter {
    fn write_frame(
      &mut self,
      _image: &RgbImage,
      _detections: &[Detection],
      _labels: &Labels,
    ) -> Result<(), OutputError> {
      self.frames += 1;
      Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
      self.finishes += 1;
      Ok(())
    }
  }

  fn detection() -> Detection {
    Detection {
      x: 1.0,
      y: 1.0,
      width: 4.0,
      height: 4.0,
      confidence: 0.9,
      class_id: 0,
    }
  }

  #[test]
  fn empty_source_releases_without_running_pipeline() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = StubSource::new(0, drops.clone());
    let detector = StubDetector::new(vec![detection()]);
    let labels = Labels::from_names(vec!["car".into()]);
    let mut writer = StubWriter::default();

    let stats = run_pipeline(source, &detector, &labels, &mut writer, 0).unwrap();

    assert_eq!(stats.frames, 0);
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    assert_eq!(writer.frames, 0);
    assert_eq!(writer.finishes, 1);
    // 输入源恰好释放一次
    assert_eq!(drops.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn processes_every_frame_in_order() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = StubSource::new(3, drops.clone());
    let detector = StubDetector::new(vec![detection(), detection()]);
    let labels = Labels::from_names(vec!["car".into()]);
    let mut writer = StubWriter::default();

    let stats = run_pipeline(source, &detector, &labels, &mut writer, 0).unwrap();

    assert_eq!(stats.frames, 3);
    assert_eq!(stats.detections, 6);
    assert_eq!(stats.skipped, 0);
    assert_eq!(writer.frames, 3);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn failed_frame_is_skipped_not_fatal() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = StubSource::new(3, drops.clone());
    let mut detector = StubDetector::new(vec![detection()]);
    detector.fail_on_call = Some(1);
    let labels = Labels::from_names(vec!["car".into()]);
    let mut writer = StubWriter::default();

    let stats = run_pipeline(source, &detector, &labels, &mut writer, 0).unwrap();

    assert_eq!(stats.frames, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(writer.frames, 2);
  }

  #[test]
  fn max_frames_limits_processing() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = StubSource::new(10, drops.clone());
    let detector = StubDetector::new(vec![]);
    let labels = Labels::from_names(vec!["car".into()]);
    let mut writer = StubWriter::default();

    let stats = run_pipeline(source, &detector, &labels, &mut writer, 4).unwrap();

    assert_eq!(stats.frames, 4);
    assert_eq!(writer.frames, 4);
  }
}
