// ==========================================
// 折扣测算系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// 基础配置缺失为致命错误（用户覆写文件缺失只记录警告）
    #[error("基础配置文件不存在: {0}")]
    NotFound(String),

    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置解析失败 ({path}): {message}")]
    ParseError { path: String, message: String },

    #[error("配置结构无效: {0}")]
    InvalidStructure(String),

    #[error("配置项缺失: {0}")]
    MissingKey(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
