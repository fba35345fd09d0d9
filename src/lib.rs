// 该文件是 Chejian （车检） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

pub mod detector;
pub mod input;
pub mod labels;
pub mod output;
pub mod task;

use thiserror::Error;

/// 进程级初始化错误
#[derive(Error, Debug)]
pub enum InitError {
  #[cfg(feature = "video")]
  #[error("无法初始化 FFmpeg: {0}")]
  Ffmpeg(#[from] ffmpeg_next::Error),
}

/// 进程级初始化。
///
/// 必须在构造任何检测器或输入源之前调用一次；
/// 外部库的全局状态在这里显式加载，而不是在首次使用时隐式加载。
/// 没有对应的反初始化，资源在进程退出时由操作系统回收。
pub fn init() -> Result<(), InitError> {
  #[cfg(feature = "video")]
  ffmpeg_next::init()?;

  Ok(())
}
