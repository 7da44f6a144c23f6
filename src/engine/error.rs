// ==========================================
// 折扣测算系统 - 引擎层错误类型
// ==========================================
// 规则: 任一行失败即整体中止，不返回部分结果
// ==========================================

use crate::domain::table::TableError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] TableError),

    /// row 从 1 开始计数
    #[error("数值无效 (行 {row}, 列 {column}): '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("日期无效 (行 {row}, 列 {column}): '{value}'")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("配置缺失: {0}")]
    MissingConfig(String),
}

impl EngineError {
    /// 是否为缺列错误
    pub fn is_missing_column(&self) -> bool {
        matches!(self, EngineError::Table(TableError::MissingColumn { .. }))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
