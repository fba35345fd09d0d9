// 该文件是 Chejian （车检） 项目的一部分。
// src/labels.rs - 类别标签表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use thiserror::Error;

/// 标签表错误
#[derive(Error, Debug)]
pub enum LabelError {
  #[error("无法读取标签文件 {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("类别索引 {class_id} 超出标签表范围（共 {len} 个标签），模型与标签文件不匹配")]
  UnknownClass { class_id: usize, len: usize },
}

/// 类别标签表
///
/// 一行一个类别名称，行号即类别索引。加载后只读。
/// 不做去重，也不校验数量是否与模型输出类别一致；
/// 数量不匹配会在查找时以 [`LabelError::UnknownClass`] 暴露。
#[derive(Debug, Clone)]
pub struct Labels {
  names: Vec<String>,
}

impl Labels {
  /// 从文本文件加载标签表
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
      path: path.display().to_string(),
      source,
    })?;

    let names = content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();

    Ok(Self { names })
  }

  /// 从名称列表构造标签表
  pub fn from_names(names: Vec<String>) -> Self {
    Self { names }
  }

  /// 按类别索引查找名称
  ///
  /// 索引越界说明模型输出与标签文件不匹配，这是配置错误，
  /// 调用方不应吞掉该错误。
  pub fn get(&self, class_id: usize) -> Result<&str, LabelError> {
    self
      .names
      .get(class_id)
      .map(String::as_str)
      .ok_or(LabelError::UnknownClass {
        class_id,
        len: self.names.len(),
      })
  }

  /// 标签数量
  pub fn len(&self) -> usize {
    self.names.len()
  }

  /// 标签表是否为空
  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}
