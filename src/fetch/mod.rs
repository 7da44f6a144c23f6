// ==========================================
// 折扣测算系统 - 远程数据层
// ==========================================
// 职责: HTTP JSON 数据源 + 显式 TTL/LRU 缓存
// ==========================================

pub mod cache;
pub mod error;
pub mod source;

pub use cache::{CachePolicy, CacheStats, CachedSource};
pub use error::{FetchError, FetchResult};
pub use source::{HttpJsonSource, RemoteSource};
