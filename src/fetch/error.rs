// ==========================================
// 折扣测算系统 - 远程数据错误类型
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("远程接口返回非 200 状态: {0}")]
    Status(u16),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("远程数据解析失败: {0}")]
    Parse(#[from] ImportError),

    #[error("缓存配置无效: {0}")]
    InvalidPolicy(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
