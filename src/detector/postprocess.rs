// 该文件是 Chejian （车检） 项目的一部分。
// src/detector/postprocess.rs - 检测结果后处理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use super::{Candidate, Detection};

/// 检测结果后处理器
///
/// 按置信度阈值过滤候选项，并把归一化坐标换算为像素空间边界框。
/// 非极大值抑制默认关闭（沿用原始行为，重叠框不合并），
/// 可通过 [`PostProcessor::with_nms`] 显式开启。
#[derive(Debug, Clone)]
pub struct PostProcessor {
  /// 置信度阈值，严格大于该值的候选项才保留
  confidence_threshold: f32,
  /// NMS IOU 阈值，None 表示不做抑制
  nms_threshold: Option<f32>,
}

impl PostProcessor {
  /// 创建一个新的后处理器，不启用 NMS
  pub fn new(confidence_threshold: f32) -> Self {
    Self {
      confidence_threshold,
      nms_threshold: None,
    }
  }

  /// 设置 NMS IOU 阈值
  pub fn with_nms(mut self, nms_threshold: Option<f32>) -> Self {
    self.nms_threshold = nms_threshold;
    self
  }

  /// 过滤候选项并换算到像素空间
  ///
  /// 阈值比较为严格大于；输出顺序与输入顺序一致。
  pub fn process(&self, candidates: &[Candidate], width: u32, height: u32) -> Vec<Detection> {
    let (w, h) = (width as f32, height as f32);

    let detections: Vec<Detection> = candidates
      .iter()
      .filter(|candidate| candidate.score > self.confidence_threshold)
      .map(|candidate| {
        let [x_min, y_min, x_max, y_max] = candidate.bbox;
        Detection {
          x: x_min * w,
          y: y_min * h,
          width: (x_max - x_min) * w,
          height: (y_max - y_min) * h,
          confidence: candidate.score,
          class_id: candidate.class_id,
        }
      })
      .collect();

    match self.nms_threshold {
      Some(iou_threshold) => Self::nms(detections, iou_threshold),
      None => detections,
    }
  }

  /// 非极大值抑制
  ///
  /// 按置信度降序贪心保留，同类别且 IOU 超过阈值的框被抑制。
  fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
      b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut result = Vec::new();

    while !detections.is_empty() {
      let best = detections.remove(0);

      detections.retain(|det| {
        if det.class_id != best.class_id {
          return true;
        }
        Self::iou(&best, det) < iou_threshold
      });

      result.push(best);
    }

    result
  }

  /// 计算两个边界框的 IOU
  fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = a.width * a.height;
    let area_b = b.width * b.height;
    let union = area_a + area_b - intersection;

    if union > 0.0 { intersection / union } else { 0.0 }
  }
}
