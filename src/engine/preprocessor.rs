// ==========================================
// 折扣测算系统 - 销量/价格预处理
// ==========================================
// 输入: 明细销量表 + 价格参考表
// 输出: 每个产品一行的基础表（月均度量 + 单价 + 组合键）
// 步骤: 年份过滤 → 剔除厂商 → 度量转浮点 → 空值占位 → 编码校正
//       → 分组取平均 → 关联价格 → 列重命名 → 拼接组合键
// ==========================================

use crate::config::app_config::PreprocessorConfig;
use crate::config::insumo_config_trait::InsumoConfigReader;
use crate::domain::table::{CellValue, Table};
use crate::domain::types::columns;
use crate::engine::concat::concat_columns;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::table_ops::{self, AggOp};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

pub struct SalesPreprocessor {
    config: PreprocessorConfig,
}

impl SalesPreprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    pub fn from_reader(reader: &dyn InsumoConfigReader) -> EngineResult<Self> {
        let config = reader
            .preprocessor()
            .map_err(|e| EngineError::MissingConfig(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    #[instrument(skip_all, fields(sales = sales.len(), prices = prices.len()))]
    pub fn process(&self, sales: &Table, prices: &Table) -> EngineResult<Table> {
        let cfg = &self.config;

        let df = self.filter_years(sales)?;
        let df = self.exclude_manufacturer(&df)?;
        let df = self.cast_measures(&df)?;
        let df = self.fill_placeholders(&df)?;
        let df = self.reconcile_ids(&df)?;

        let grouped = table_ops::group_by(&df, &cfg.group_cols, &cfg.measure_cols, AggOp::Mean)?;
        debug!(groups = grouped.len(), "分组取平均完成");

        let joined = self.join_prices(&grouped, prices)?;
        let renamed = table_ops::rename_columns(&joined, &cfg.rename)?;
        let result = concat_columns(
            &renamed,
            &cfg.concat_cols,
            columns::CONCAT_PLU_PRODUCTO,
            Some(cfg.separator.as_str()),
        )?;

        info!(rows = result.len(), "销量/价格预处理完成");
        Ok(result)
    }

    // ==========================================
    // 各步骤
    // ==========================================

    /// 只保留年份在配置列表中的行；无法解析的年份剔除
    fn filter_years(&self, df: &Table) -> EngineResult<Table> {
        let idx = df.require_column(&self.config.year_col)?;
        let years = &self.config.years;
        let kept = df.filter_rows(|row| {
            row[idx]
                .as_i64()
                .map(|y| years.contains(&y))
                .unwrap_or(false)
        });
        debug!(before = df.len(), after = kept.len(), "年份过滤");
        Ok(kept)
    }

    /// 厂商精确等于排除标签的行剔除（此处不做 TRIM）
    fn exclude_manufacturer(&self, df: &Table) -> EngineResult<Table> {
        Ok(table_ops::filter_by_values(
            df,
            &self.config.manufacturer_col,
            &[self.config.excluded_manufacturer.as_str()],
            false,
        )?)
    }

    /// 度量列转浮点；无法解析 → Null
    fn cast_measures(&self, df: &Table) -> EngineResult<Table> {
        let mut result = df.clone();
        for col in &self.config.measure_cols {
            let idx = result.require_column(col)?;
            result.derive_column(col, |_, row| row[idx].as_f64().into())?;
        }
        Ok(result)
    }

    /// 非度量列的 Null 填充占位值（分组键不接受空值）
    fn fill_placeholders(&self, df: &Table) -> EngineResult<Table> {
        let mut result = df.clone();
        let placeholder = &self.config.null_placeholder;
        let text_cols: Vec<String> = df
            .columns()
            .iter()
            .filter(|c| !self.config.measure_cols.contains(c))
            .cloned()
            .collect();

        for col in &text_cols {
            let idx = result.require_column(col)?;
            result.derive_column(col, |_, row| {
                if row[idx].is_null() {
                    CellValue::text(placeholder.clone())
                } else {
                    row[idx].clone()
                }
            })?;
        }
        Ok(result)
    }

    /// 编码与参考编码不一致的行构成 参考 → 编码 映射（首次出现为准），
    /// 再把参考编码命中映射的行的编码替换掉
    fn reconcile_ids(&self, df: &Table) -> EngineResult<Table> {
        let id = df.require_column(&self.config.id_col)?;
        let reference = df.require_column(&self.config.reference_id_col)?;

        let mut mapping: HashMap<String, String> = HashMap::new();
        for row in df.rows() {
            let (Some(id_val), Some(ref_val)) = (row[id].as_key(), row[reference].as_key()) else {
                continue;
            };
            if id_val != ref_val {
                mapping.entry(ref_val).or_insert(id_val);
            }
        }
        debug!(substitutions = mapping.len(), "编码校正映射");

        Ok(table_ops::replace_by_mapping(
            df,
            &self.config.id_col,
            &self.config.reference_id_col,
            &mapping,
        )?)
    }

    /// 左关联价格参考表；缺失单价记为 0
    fn join_prices(&self, grouped: &Table, prices: &Table) -> EngineResult<Table> {
        let cfg = &self.config;
        let mut price_ref = table_ops::select(
            prices,
            &[&cfg.price_key_col, &cfg.price_col, &cfg.subline_col],
        )?;
        if cfg.price_key_col != cfg.id_col {
            price_ref.rename_column(&cfg.price_key_col, &cfg.id_col)?;
        }

        let mut joined = table_ops::left_join(grouped, &price_ref, &[&cfg.id_col])?;
        let price_idx = joined.require_column(&cfg.price_col)?;
        joined.derive_column(&cfg.price_col, |_, row| {
            CellValue::Float(row[price_idx].as_f64().unwrap_or(0.0))
        })?;
        Ok(joined)
    }
}
