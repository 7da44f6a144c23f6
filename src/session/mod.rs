// ==========================================
// 折扣测算系统 - 会话层
// ==========================================
// 职责: 单用户会话状态（键值上下文 + 折扣测算流程状态）
// ==========================================

pub mod context;
pub mod discount_session;

pub use context::SessionContext;
pub use discount_session::{keys, DiscountSession, SessionError, SessionResult};
