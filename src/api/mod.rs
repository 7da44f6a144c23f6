// ==========================================
// 折扣测算系统 - API 层
// ==========================================
// 职责: 对外业务接口（CLI 与集成测试调用）
// ==========================================

pub mod discount_api;
pub mod error;
pub mod validator;

pub use discount_api::{DiscountApi, SUMMARY_COLUMNS};
pub use error::{ApiError, ApiResult};
pub use validator::{
    selection_placeholder, validate_numeric, validate_selection, InputKind, InputValidation,
    InputValue,
};
