// 该文件是 Chejian （车检） 项目的一部分。
// src/output/visualizer.rs - 检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::warn;

use super::OutputError;
use crate::detector::Detection;
use crate::labels::{LabelError, Labels};

/// 调色板大小
const PALETTE_SIZE: usize = 32;
/// 标签文本相对边框上沿的偏移
const LABEL_TEXT_OFFSET: i32 = 20;

/// 常见系统字体位置，按顺序探测
const FONT_SEARCH_PATHS: [&str; 4] = [
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// 标签文本: `"<名称> (<百分比>%)"`，百分比四舍五入取整
pub fn label_text(name: &str, confidence: f32) -> String {
  format!("{} ({}%)", name, (confidence * 100.0).round() as i32)
}

/// 可视化工具
///
/// 在图像上就地绘制检测框和标签文本。
/// 没有可用字体时退化为只画边框。
pub struct Visualizer {
  /// 字体，None 表示跳过文本绘制
  font: Option<FontArc>,
  /// 字体大小
  font_scale: PxScale,
  /// 类别颜色映射
  colors: Vec<Rgb<u8>>,
}

impl Visualizer {
  pub(crate) fn with_font(font: Option<FontArc>) -> Self {
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      font,
      font_scale: PxScale::from(16.0),
      colors,
    }
  }

  /// 从指定字体文件创建可视化工具
  pub fn from_font_file(path: &str) -> Result<Self, OutputError> {
    let data = std::fs::read(path).map_err(|e| OutputError::Font {
      path: path.to_string(),
      reason: e.to_string(),
    })?;
    let font = FontArc::try_from_vec(data).map_err(|e| OutputError::Font {
      path: path.to_string(),
      reason: e.to_string(),
    })?;

    Ok(Self::with_font(Some(font)))
  }

  /// 探测系统字体并创建可视化工具
  ///
  /// 所有候选位置都没有字体时只画边框，不画标签文本。
  pub fn discover() -> Self {
    for path in FONT_SEARCH_PATHS {
      if let Ok(v) = Self::from_font_file(path) {
        return v;
      }
    }

    warn!("没有找到可用字体，标注将只包含边框，不包含标签文本");
    Self::with_font(None)
  }

  /// HSV 转 RGB
  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    Rgb([
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ])
  }

  /// 在图像上就地绘制检测结果
  ///
  /// 零个检测时不触碰任何像素。
  /// 类别索引查不到标签说明模型与标签文件不匹配，立刻报错，
  /// 已绘制的检测保留在图像上。
  pub fn draw_detections(
    &self,
    image: &mut RgbImage,
    detections: &[Detection],
    labels: &Labels,
  ) -> Result<(), LabelError> {
    for detection in detections {
      let name = labels.get(detection.class_id)?;
      let color = self.colors[detection.class_id % self.colors.len()];

      // 绘制边界框
      let x = detection.x.max(0.0) as i32;
      let y = detection.y.max(0.0) as i32;
      let width = detection.width.min(image.width() as f32 - detection.x) as u32;
      let height = detection.height.min(image.height() as f32 - detection.y) as u32;

      if width > 0 && height > 0 {
        let rect = Rect::at(x, y).of_size(width, height);
        draw_hollow_rect_mut(image, rect, color);

        // 内侧再画一圈以增加可见度
        if x > 0 && y > 0 && width > 2 && height > 2 {
          let inner_rect =
            Rect::at(x + 1, y + 1).of_size(width.saturating_sub(2), height.saturating_sub(2));
          draw_hollow_rect_mut(image, inner_rect, color);
        }
      }

      // 绘制标签文本（边框上方）
      if let Some(font) = &self.font {
        let label = label_text(name, detection.confidence);
        let text_y = (y - LABEL_TEXT_OFFSET).max(0);
        draw_text_mut(image, color, x, text_y, self.font_scale, font, &label);
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(class_id: usize, confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
    Detection {
      x,
      y,
      width: w,
      height: h,
      confidence,
      class_id,
    }
  }

  #[test]
  fn label_text_rounds_percentage() {
    assert_eq!(label_text("car", 0.876), "car (88%)");
    assert_eq!(label_text("car", 0.872), "car (87%)");
    assert_eq!(label_text("bus", 0.5), "bus (50%)");
    assert_eq!(label_text("truck", 1.0), "truck (100%)");
  }

  #[test]
  fn zero_detections_touch_no_pixels() {
    let visualizer = Visualizer::with_font(None);
    let labels = Labels::from_names(vec!["car".into()]);

    let mut image = RgbImage::from_fn(16, 16, |x, y| Rgb([x as u8, y as u8, 7]));
    let before = image.clone();

    visualizer.draw_detections(&mut image, &[], &labels).unwrap();
    assert_eq!(image.as_raw(), before.as_raw());
  }

  #[test]
  fn one_detection_draws_a_rectangle() {
    let visualizer = Visualizer::with_font(None);
    let labels = Labels::from_names(vec!["background".into(), "car".into()]);

    let mut image = RgbImage::new(20, 20);
    visualizer
      .draw_detections(&mut image, &[detection(1, 0.9, 2.0, 2.0, 10.0, 10.0)], &labels)
      .unwrap();

    // 边框左上角像素被着色
    assert_ne!(*image.get_pixel(2, 2), Rgb([0, 0, 0]));
    // 框外像素未被触碰
    assert_eq!(*image.get_pixel(19, 19), Rgb([0, 0, 0]));
  }

  #[test]
  fn unknown_class_fails_loudly() {
    let visualizer = Visualizer::with_font(None);
    let labels = Labels::from_names(vec!["car".into()]);

    let mut image = RgbImage::new(20, 20);
    let err = visualizer
      .draw_detections(&mut image, &[detection(9, 0.9, 2.0, 2.0, 5.0, 5.0)], &labels)
      .unwrap_err();
    assert!(matches!(err, LabelError::UnknownClass { class_id: 9, .. }));
  }
}
