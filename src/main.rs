// 该文件是 Chejian （车检） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use chejian::detector::{PostProcessor, SsdDetector};
use chejian::input::{SourceType, create_frame_source};
use chejian::labels::Labels;
use chejian::output::{Visualizer, create_output_writer};
use chejian::task::run_pipeline;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("标签文件路径: {}", args.labels);
  info!("输入来源: {}", args.input);
  info!("输出位置: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  match args.nms {
    Some(iou) => info!("NMS IOU 阈值: {}", iou),
    None => info!("NMS: 关闭"),
  }

  chejian::init().context("进程初始化失败")?;

  // 加载标签与模型，两者任一失败都在启动阶段中止
  let labels = Labels::load(&args.labels)?;
  info!("标签加载完成，共 {} 个类别", labels.len());

  let post = PostProcessor::new(args.confidence).with_nms(args.nms);
  let detector = SsdDetector::new(&args.model, post)?;
  debug!("模型输出节点: {:?}", detector.output_names());
  info!("模型加载完成");

  // 打开输入源
  let source = create_frame_source(&args.input)?;
  info!(
    "输入源已打开: {}x{} {}",
    source.width(),
    source.height(),
    match source.source_type() {
      SourceType::Image => "图片",
      SourceType::Video => "视频",
    }
  );

  // 创建输出写入器
  let visualizer = match &args.font {
    Some(path) => Visualizer::from_font_file(path)?,
    None => Visualizer::discover(),
  };
  let mut writer = create_output_writer(&args.output, visualizer)?;

  info!("开始处理...");
  let stats = run_pipeline(
    source,
    &detector,
    &labels,
    writer.as_mut(),
    args.max_frames,
  )?;

  info!(
    "处理完成: 共 {} 帧, {} 个检测, 跳过 {} 帧",
    stats.frames, stats.detections, stats.skipped
  );

  Ok(())
}
