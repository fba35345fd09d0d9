// 该文件是 Chejian （车检） 项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use clap::Parser;

/// Chejian 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测模型文件路径（rten 格式）
  #[arg(long, value_name = "FILE")]
  pub model: String,

  /// 类别标签文件路径（一行一个类别名称）
  #[arg(long, value_name = "FILE")]
  pub labels: String,

  /// 输入来源（图片文件或视频文件）
  /// 支持格式:
  /// - 图片: *.jpg, *.jpeg, *.png, *.bmp, *.gif, *.webp
  /// - 视频: *.mp4, *.avi, *.mkv 等（需要 video 特性）
  #[arg(long, value_name = "SOURCE")]
  pub input: String,

  /// 输出位置
  /// 支持格式:
  /// - 图片: *.jpg, *.jpeg, *.png, *.bmp
  /// - 目录: 逐帧保存标注图片和检测记录
  #[arg(long, value_name = "OUTPUT")]
  pub output: String,

  /// 置信度阈值 (0.0 - 1.0)，严格大于该值的检测才保留
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)，不指定则不做重叠框抑制
  #[arg(long, value_name = "THRESHOLD")]
  pub nms: Option<f32>,

  /// 最大处理帧数（仅对视频有效，0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_frames: u64,

  /// 标注字体文件路径（TTF），不指定则探测系统字体
  #[arg(long, value_name = "FILE")]
  pub font: Option<String>,
}
