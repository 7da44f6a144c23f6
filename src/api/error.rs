// ==========================================
// 折扣测算系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，给调用方（CLI）统一的错误出口
// ==========================================

use crate::config::error::ConfigError;
use crate::domain::scenario::ScenarioError;
use crate::domain::table::TableError;
use crate::engine::error::EngineError;
use crate::exporter::error::ExportError;
use crate::fetch::error::FetchError;
use crate::importer::error::ImportError;
use crate::session::SessionError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("尚未载入基础数据")]
    NoBaseLoaded,

    #[error("尚未登记任何折扣场景")]
    NoScenarios,

    #[error("尚未确认增长百分比")]
    GrowthNotConfirmed,

    // ==========================================
    // 下层错误
    // ==========================================
    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("计算失败: {0}")]
    Engine(#[from] EngineError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("远程数据错误: {0}")]
    Fetch(#[from] FetchError),

    #[error("导出失败: {0}")]
    Export(#[from] ExportError),

    #[error("会话错误: {0}")]
    Session(#[from] SessionError),

    #[error("表格错误: {0}")]
    Table(#[from] TableError),

    #[error("场景无效: {0}")]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为用户可修正的输入问题（CLI 以非零退出码但不打印堆栈）
    pub fn is_user_error(&self) -> bool {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::NoBaseLoaded
            | ApiError::NoScenarios
            | ApiError::GrowthNotConfirmed => true,
            ApiError::Session(e) => matches!(
                e,
                SessionError::RangoFueraDeRango { .. } | SessionError::IndexOutOfRange { .. }
            ),
            ApiError::Import(ImportError::FileNotFound(_))
            | ApiError::Import(ImportError::UnsupportedFormat(_)) => true,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
