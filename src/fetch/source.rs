// ==========================================
// 折扣测算系统 - 远程数据源
// ==========================================
// 接口返回: JSON 数组的数组（首行为表头）
// ==========================================

use crate::config::app_config::FetchConfig;
use crate::domain::table::Table;
use crate::fetch::error::{FetchError, FetchResult};
use crate::importer::json_parser::JsonRowsParser;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// 远程表格数据源
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// 拉取 url 对应的表格
    async fn fetch_table(&self, url: &str) -> FetchResult<Table>;
}

/// 基于 reqwest 的 HTTP JSON 数据源
pub struct HttpJsonSource {
    client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> FetchResult<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl RemoteSource for HttpJsonSource {
    #[instrument(skip(self))]
    async fn fetch_table(&self, url: &str) -> FetchResult<Table> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let table = JsonRowsParser.parse_value(&body)?;
        debug!(rows = table.len(), "远程数据拉取完成");
        Ok(table)
    }
}
