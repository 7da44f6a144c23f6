// ==========================================
// 折扣测算系统 - 远程数据缓存
// ==========================================
// 策略: 按 url 缓存；超过 ttl 视为过期；超过容量按 LRU 淘汰
// 并发: tokio Mutex 保护（LruCache 读取也需要 &mut）
// ==========================================

use crate::config::app_config::FetchConfig;
use crate::domain::table::Table;
use crate::fetch::error::{FetchError, FetchResult};
use crate::fetch::source::RemoteSource;
use async_trait::async_trait;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub capacity: NonZeroUsize,
}

impl CachePolicy {
    pub fn new(ttl: Duration, capacity: usize) -> FetchResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| FetchError::InvalidPolicy("容量必须大于 0".to_string()))?;
        Ok(Self { ttl, capacity })
    }

    pub fn from_config(config: &FetchConfig) -> FetchResult<Self> {
        Self::new(Duration::from_secs(config.ttl_secs), config.capacity)
    }
}

/// 命中统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry {
    table: Table,
    stored_at: Instant,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// 带缓存的数据源（包装任意 RemoteSource）
pub struct CachedSource<S: RemoteSource> {
    inner: S,
    policy: CachePolicy,
    state: Mutex<CacheState>,
}

impl<S: RemoteSource> CachedSource<S> {
    pub fn new(inner: S, policy: CachePolicy) -> Self {
        Self {
            inner,
            policy,
            state: Mutex::new(CacheState {
                entries: LruCache::new(policy.capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// 读取；未命中或已过期时请求内部数据源并写入缓存
    ///
    /// 请求期间不持有锁，同一 url 的并发未命中可能各自请求一次
    pub async fn get(&self, url: &str) -> FetchResult<Table> {
        {
            let mut state = self.state.lock().await;
            let fresh = state
                .entries
                .get(url)
                .filter(|entry| entry.stored_at.elapsed() < self.policy.ttl)
                .map(|entry| entry.table.clone());

            match fresh {
                Some(table) => {
                    state.hits += 1;
                    debug!(url, "缓存命中");
                    return Ok(table);
                }
                None => {
                    state.entries.pop(url);
                    state.misses += 1;
                }
            }
        }

        debug!(url, "缓存未命中，请求远程数据");
        let table = self.inner.fetch_table(url).await?;

        let mut state = self.state.lock().await;
        if let Some((evicted, _)) = state.entries.push(
            url.to_string(),
            CacheEntry {
                table: table.clone(),
                stored_at: Instant::now(),
            },
        ) {
            if evicted != url {
                debug!(evicted = %evicted, "缓存容量已满，淘汰最久未使用项");
            }
        }
        Ok(table)
    }

    /// 使某个 url 失效；返回是否存在
    pub async fn invalidate(&self, url: &str) -> bool {
        let removed = self.state.lock().await.entries.pop(url).is_some();
        if removed {
            info!(url, "缓存项已失效");
        }
        removed
    }

    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
        info!("缓存已清空");
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }
}

#[async_trait]
impl<S: RemoteSource> RemoteSource for CachedSource<S> {
    async fn fetch_table(&self, url: &str) -> FetchResult<Table> {
        self.get(url).await
    }
}
