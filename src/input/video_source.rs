// 该文件是 Chejian （车检） 项目的一部分。
// src/input/video_source.rs - 视频输入源
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::{Pixel, input};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{context::Context as ScalingContext, flag::Flags};
use ffmpeg_next::util::frame::video::Video;
use image::RgbImage;

use super::{Frame, FrameSource, InputError, SourceType};

/// 视频输入源
///
/// 严格顺序、阻塞读取，不支持跳帧或定位；
/// 读到流尾后进入终止状态，解码资源随 drop 释放。
/// 使用前需要先调用 [`crate::init`] 完成 FFmpeg 全局初始化。
pub struct VideoSource {
  /// FFmpeg 输入上下文
  input_context: ffmpeg::format::context::Input,
  /// 视频流索引
  video_stream_index: usize,
  /// 视频解码器
  decoder: ffmpeg::decoder::Video,
  /// 缩放上下文（解码格式 -> RGB24）
  scaler: ScalingContext,
  /// 帧索引
  frame_index: u64,
  /// 视频宽度
  width: u32,
  /// 视频高度
  height: u32,
  /// 帧率
  fps: f64,
  /// 时间基准
  time_base: f64,
  /// 是否结束
  finished: bool,
}

impl VideoSource {
  /// 打开视频文件并创建输入源
  pub fn new(path: &str) -> Result<Self, InputError> {
    let open = |source: Box<dyn std::error::Error + Send + Sync>| InputError::Open {
      path: path.to_string(),
      source,
    };

    let input_context = input(&path).map_err(|e| open(Box::new(e)))?;

    let video_stream = input_context
      .streams()
      .best(Type::Video)
      .ok_or_else(|| open("找不到视频流".into()))?;

    let video_stream_index = video_stream.index();
    let context_decoder =
      ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())
        .map_err(|e| open(Box::new(e)))?;
    let decoder = context_decoder
      .decoder()
      .video()
      .map_err(|e| open(Box::new(e)))?;

    let width = decoder.width();
    let height = decoder.height();

    let fps = video_stream.avg_frame_rate();
    let fps = fps.numerator() as f64 / fps.denominator().max(1) as f64;

    let time_base = video_stream.time_base();
    let time_base = time_base.numerator() as f64 / time_base.denominator().max(1) as f64;

    let scaler = ScalingContext::get(
      decoder.format(),
      width,
      height,
      Pixel::RGB24,
      width,
      height,
      Flags::BILINEAR,
    )
    .map_err(|e| open(Box::new(e)))?;

    Ok(Self {
      input_context,
      video_stream_index,
      decoder,
      scaler,
      frame_index: 0,
      width,
      height,
      fps,
      time_base,
      finished: false,
    })
  }

  /// 解码下一帧
  fn decode_next_frame(&mut self) -> Result<Option<Video>, ffmpeg::Error> {
    loop {
      // 先尝试取出解码器里已经就绪的帧
      let mut decoded = Video::empty();
      if self.decoder.receive_frame(&mut decoded).is_ok() {
        return Ok(Some(decoded));
      }

      // 读取下一个数据包
      let mut packet_iter = self.input_context.packets();
      loop {
        match packet_iter.next() {
          Some((stream, packet)) => {
            if stream.index() == self.video_stream_index {
              self.decoder.send_packet(&packet)?;
              break;
            }
          }
          None => {
            // 流尾：冲刷解码器剩余帧
            self.decoder.send_eof()?;
            if self.decoder.receive_frame(&mut decoded).is_ok() {
              return Ok(Some(decoded));
            }
            return Ok(None);
          }
        }
      }
    }
  }
}

impl Iterator for VideoSource {
  type Item = Result<Frame, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    match self.decode_next_frame() {
      Ok(Some(decoded)) => {
        let mut rgb_frame = Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
          self.finished = true;
          return Some(Err(InputError::Decode(e.to_string())));
        }

        let data = rgb_frame.data(0);
        let stride = rgb_frame.stride(0);
        let width = self.width as usize;
        let height = self.height as usize;

        // 逐行拷贝，剥离步长对齐的填充字节
        let mut image_data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
          let row_start = y * stride;
          let row_end = row_start + width * 3;
          image_data.extend_from_slice(&data[row_start..row_end]);
        }

        let image = match RgbImage::from_raw(self.width, self.height, image_data) {
          Some(img) => img,
          None => {
            self.finished = true;
            return Some(Err(InputError::Decode("无法创建 RGB 图像".to_string())));
          }
        };

        let timestamp_ms = decoded
          .timestamp()
          .map_or(0, |ts| (ts as f64 * self.time_base * 1000.0) as u64);

        let frame = Frame {
          image,
          index: self.frame_index,
          timestamp_ms,
        };

        self.frame_index += 1;
        Some(Ok(frame))
      }
      Ok(None) => {
        self.finished = true;
        None
      }
      Err(e) => {
        self.finished = true;
        Some(Err(InputError::Decode(e.to_string())))
      }
    }
  }
}

impl FrameSource for VideoSource {
  fn source_type(&self) -> SourceType {
    SourceType::Video
  }

  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn fps(&self) -> Option<f64> {
    Some(self.fps)
  }
}
