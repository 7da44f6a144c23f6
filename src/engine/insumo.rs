// ==========================================
// 折扣测算系统 - 折扣计算流程
// ==========================================
// 输入: 场景表 ⟕ 基础表（每行: 组合键 + 折扣 + 活动窗口 + 月均销量 + 单价）
// 输出: 追加 天数 / 件数 / 增长 / 总件数 / 销售额 / 折扣率 / 折扣成本 列
// 规则: 阶段顺序固定；任一行出错整个流程中止，不返回部分结果
// ==========================================

use crate::config::app_config::ColumnMapping;
use crate::config::insumo_config_trait::InsumoConfigReader;
use crate::domain::table::{CellValue, Table};
use crate::domain::types::{columns, translate_month, DIAS_MES};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument};

// ==========================================
// 流程选项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// false: 不按活动窗口计算天数，直接使用已有的天数列
    pub compute_days: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { compute_days: true }
    }
}

// ==========================================
// 单元格读取
// ==========================================

fn number_at(row: &[CellValue], idx: usize, row_no: usize, column: &str) -> EngineResult<f64> {
    row[idx].as_f64().ok_or_else(|| EngineError::InvalidNumber {
        row: row_no + 1,
        column: column.to_string(),
        value: row[idx].to_string(),
    })
}

/// 支持 YYYY-MM-DD / YYYYMMDD / YYYY-MM-DD HH:MM:SS
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn date_at(row: &[CellValue], idx: usize, row_no: usize, column: &str) -> EngineResult<NaiveDate> {
    row[idx]
        .as_key()
        .and_then(|v| parse_date(&v))
        .ok_or_else(|| EngineError::InvalidDate {
            row: row_no + 1,
            column: column.to_string(),
            value: row[idx].to_string(),
        })
}

// ==========================================
// InsumoProcessor - 计算流程
// ==========================================
pub struct InsumoProcessor {
    columns: ColumnMapping,
    options: PipelineOptions,
}

impl InsumoProcessor {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            options: PipelineOptions::default(),
        }
    }

    /// 从配置读取列映射
    pub fn from_reader(reader: &dyn InsumoConfigReader) -> EngineResult<Self> {
        let columns = reader
            .column_mapping()
            .map_err(|e| EngineError::MissingConfig(e.to_string()))?;
        Ok(Self::new(columns))
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    /// 执行完整流程，返回新表（入参不变）
    ///
    /// # 参数
    /// - insumo: 关联后的计算输入
    /// - growth_pct: 活动增长百分比（10 表示 10%）
    #[instrument(skip(self, insumo), fields(rows = insumo.len(), growth_pct = growth_pct))]
    pub fn process(&self, insumo: &Table, growth_pct: f64) -> EngineResult<Table> {
        let mut df = insumo.clone();

        if self.options.compute_days {
            self.update_days(&mut df)?;
        } else {
            df.require_column(&self.columns.dias_actividad)?;
            debug!("跳过活动天数计算，使用已有天数列");
        }
        self.compute_units(&mut df)?;
        self.compute_totals(&mut df, growth_pct)?;
        self.compute_sales(&mut df)?;
        self.compute_discount_ratio(&mut df)?;
        self.translate_months(&mut df)?;
        self.compute_discount_cost(&mut df)?;

        info!(rows = df.len(), "折扣计算完成");
        Ok(df)
    }

    // ==========================================
    // 各阶段
    // ==========================================

    /// 天数 = |fecha_fin - fecha_inicio|（不含 +1）
    fn update_days(&self, df: &mut Table) -> EngineResult<()> {
        let inicio = df.require_column(columns::FECHA_INICIO)?;
        let fin = df.require_column(columns::FECHA_FIN)?;

        df.try_derive_column(&self.columns.dias_actividad, |i, row| {
            let start = date_at(row, inicio, i, columns::FECHA_INICIO)?;
            let end = date_at(row, fin, i, columns::FECHA_FIN)?;
            Ok::<_, EngineError>(CellValue::Int((end - start).num_days().abs()))
        })
    }

    /// Unidades = ceil(月均销量 / 30 * 天数)
    fn compute_units(&self, df: &mut Table) -> EngineResult<()> {
        let prom_col = self.columns.promedio_mes_und.as_str();
        let dias_col = self.columns.dias_actividad.as_str();
        let prom = df.require_column(prom_col)?;
        let dias = df.require_column(dias_col)?;

        df.try_derive_column(columns::UNIDADES, |i, row| {
            let promedio = number_at(row, prom, i, prom_col)?;
            let days = number_at(row, dias, i, dias_col)?;
            Ok::<_, EngineError>(CellValue::Int((promedio / DIAS_MES * days).ceil() as i64))
        })
    }

    /// 增长件数截断为整数；总件数用未截断的增长值向上取整
    fn compute_totals(&self, df: &mut Table, growth_pct: f64) -> EngineResult<()> {
        let unid = df.require_column(columns::UNIDADES)?;

        let mut totales = Vec::with_capacity(df.len());
        df.try_derive_column(columns::CREC_ACTIVIDAD, |i, row| {
            let unidades = number_at(row, unid, i, columns::UNIDADES)?;
            let crec = unidades * growth_pct / 100.0;
            totales.push(CellValue::Int((unidades + crec).ceil() as i64));
            Ok::<_, EngineError>(CellValue::Int(crec.trunc() as i64))
        })?;
        df.set_column(columns::UNIDADES_TOTALES, totales)?;
        Ok(())
    }

    /// 销售额 = trunc(总件数 * 单价)
    fn compute_sales(&self, df: &mut Table) -> EngineResult<()> {
        let precio_col = self.columns.precio_venta.as_str();
        let totales = df.require_column(columns::UNIDADES_TOTALES)?;
        let precio = df.require_column(precio_col)?;

        df.try_derive_column(columns::VENTA_ACTIVIDAD, |i, row| {
            let unidades = number_at(row, totales, i, columns::UNIDADES_TOTALES)?;
            let price = number_at(row, precio, i, precio_col)?;
            Ok::<_, EngineError>(CellValue::Int((unidades * price).trunc() as i64))
        })
    }

    /// rango% = rango / 100（rango 先取整）
    fn compute_discount_ratio(&self, df: &mut Table) -> EngineResult<()> {
        let rango = df.require_column(columns::RANGO)?;

        df.try_derive_column(columns::RANGO_PCT, |i, row| {
            let pct = number_at(row, rango, i, columns::RANGO)?.trunc();
            Ok::<_, EngineError>(CellValue::Float(pct / 100.0))
        })
    }

    /// 英文月份名 → 西语；无 mes 列时跳过，无法识别的值原样保留
    fn translate_months(&self, df: &mut Table) -> EngineResult<()> {
        let Some(mes) = df.column_index(columns::MES) else {
            return Ok(());
        };

        df.derive_column(columns::MES, |_, row| match &row[mes] {
            CellValue::Text(name) => translate_month(name)
                .map(CellValue::text)
                .unwrap_or_else(|| row[mes].clone()),
            other => other.clone(),
        })?;
        Ok(())
    }

    /// 折扣成本 = round(销售额 * rango%)，四舍六入五成双
    fn compute_discount_cost(&self, df: &mut Table) -> EngineResult<()> {
        let venta = df.require_column(columns::VENTA_ACTIVIDAD)?;
        let ratio = df.require_column(columns::RANGO_PCT)?;

        df.try_derive_column(columns::COSTO_DESCUENTO, |i, row| {
            let sales = number_at(row, venta, i, columns::VENTA_ACTIVIDAD)?;
            let pct = number_at(row, ratio, i, columns::RANGO_PCT)?;
            Ok::<_, EngineError>(CellValue::Int((sales * pct).round_ties_even() as i64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::app_config::PreprocessorConfig;
    use crate::config::error::ConfigResult;
    use crate::domain::table::TableError;
    use crate::domain::types::DiscountRange;

    fn insumo(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(
            [
                columns::CONCAT_PLU_PRODUCTO,
                columns::RANGO,
                columns::FECHA_INICIO,
                columns::FECHA_FIN,
                columns::MES,
                columns::KEY_PROMEDIO_MES_UND,
                columns::KEY_PRECIO_VENTA,
            ],
            rows,
        )
        .unwrap()
    }

    fn row(prom: &str, inicio: &str, fin: &str, precio: &str, rango: i64) -> Vec<CellValue> {
        vec![
            "1001 : Arroz".into(),
            CellValue::Int(rango),
            inicio.into(),
            fin.into(),
            "March".into(),
            prom.into(),
            precio.into(),
        ]
    }

    fn int(table: &Table, col: &str) -> i64 {
        table.value(0, col).unwrap().as_i64().unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let table = insumo(vec![row("300", "2025-03-01", "2025-03-11", "1000", 10)]);
        let result = InsumoProcessor::new(ColumnMapping::default())
            .process(&table, 10.0)
            .unwrap();

        assert_eq!(int(&result, columns::KEY_DIAS_ACTIVIDAD), 10);
        assert_eq!(int(&result, columns::UNIDADES), 100);
        assert_eq!(int(&result, columns::CREC_ACTIVIDAD), 10);
        assert_eq!(int(&result, columns::UNIDADES_TOTALES), 110);
        assert_eq!(int(&result, columns::VENTA_ACTIVIDAD), 110000);
        assert_eq!(
            result.value(0, columns::RANGO_PCT).unwrap(),
            &CellValue::Float(0.1)
        );
        assert_eq!(int(&result, columns::COSTO_DESCUENTO), 11000);
        assert_eq!(
            result.value(0, columns::MES).unwrap(),
            &CellValue::text("Marzo")
        );
        // 入参不变
        assert!(!table.has_column(columns::UNIDADES));
    }

    #[test]
    fn test_units_ceil_and_growth_truncation() {
        // 100 / 30 * 1 = 3.33 → 4；增长 0.4 → 0；总件数 ceil(4.4) = 5
        let table = insumo(vec![row("100", "2025-01-01", "2025-01-02", "10", 10)]);
        let result = InsumoProcessor::new(ColumnMapping::default())
            .process(&table, 10.0)
            .unwrap();

        assert_eq!(int(&result, columns::UNIDADES), 4);
        assert_eq!(int(&result, columns::CREC_ACTIVIDAD), 0);
        assert_eq!(int(&result, columns::UNIDADES_TOTALES), 5);
        assert_eq!(int(&result, columns::VENTA_ACTIVIDAD), 50);
    }

    #[test]
    fn test_discount_cost_rounds_half_to_even() {
        let table = insumo(vec![
            row("30", "2025-01-01", "2025-01-02", "5", 50),
            row("30", "2025-01-01", "2025-01-02", "7", 50),
        ]);
        let result = InsumoProcessor::new(ColumnMapping::default())
            .process(&table, 0.0)
            .unwrap();

        assert_eq!(
            result.value(0, columns::COSTO_DESCUENTO).unwrap(),
            &CellValue::Int(2)
        );
        assert_eq!(
            result.value(1, columns::COSTO_DESCUENTO).unwrap(),
            &CellValue::Int(4)
        );
    }

    #[test]
    fn test_reversed_dates_use_absolute_difference() {
        let table = insumo(vec![row("300", "20250311", "2025-03-01 00:00:00", "1", 0)]);
        let result = InsumoProcessor::new(ColumnMapping::default())
            .process(&table, 0.0)
            .unwrap();
        assert_eq!(int(&result, columns::KEY_DIAS_ACTIVIDAD), 10);
    }

    #[test]
    fn test_unknown_month_kept() {
        let mut table = insumo(vec![row("300", "2025-03-01", "2025-03-11", "1", 0)]);
        table
            .set_column(columns::MES, vec![CellValue::text("Marzo")])
            .unwrap();
        let result = InsumoProcessor::new(ColumnMapping::default())
            .process(&table, 0.0)
            .unwrap();
        assert_eq!(
            result.value(0, columns::MES).unwrap(),
            &CellValue::text("Marzo")
        );
    }

    #[test]
    fn test_missing_column_aborts() {
        let table = insumo(vec![row("300", "2025-03-01", "2025-03-11", "1", 0)]);
        let mut without_price = table.clone();
        without_price.drop_column(columns::KEY_PRECIO_VENTA).unwrap();

        let result = InsumoProcessor::new(ColumnMapping::default()).process(&without_price, 0.0);
        assert_eq!(
            result,
            Err(EngineError::Table(TableError::missing(
                columns::KEY_PRECIO_VENTA
            )))
        );
    }

    #[test]
    fn test_invalid_number_reports_row() {
        let table = insumo(vec![
            row("300", "2025-03-01", "2025-03-11", "1", 0),
            row("n/a", "2025-03-01", "2025-03-11", "1", 0),
        ]);
        let result = InsumoProcessor::new(ColumnMapping::default()).process(&table, 0.0);
        assert!(matches!(
            result,
            Err(EngineError::InvalidNumber { row: 2, .. })
        ));
    }

    #[test]
    fn test_null_number_aborts() {
        let mut table = insumo(vec![row("300", "2025-03-01", "2025-03-11", "1", 0)]);
        table
            .set_column(columns::KEY_PRECIO_VENTA, vec![CellValue::Null])
            .unwrap();
        let result = InsumoProcessor::new(ColumnMapping::default()).process(&table, 0.0);
        assert!(matches!(result, Err(EngineError::InvalidNumber { .. })));
    }

    #[test]
    fn test_invalid_date() {
        let table = insumo(vec![row("300", "01/03/2025", "2025-03-11", "1", 0)]);
        let result = InsumoProcessor::new(ColumnMapping::default()).process(&table, 0.0);
        assert!(matches!(
            result,
            Err(EngineError::InvalidDate { row: 1, .. })
        ));
    }

    #[test]
    fn test_existing_day_column_without_window() {
        let table = Table::from_rows(
            ["concat_plu_producto", "rango", "dias", "prom", "pvp"],
            vec![vec![
                "1001 : Arroz".into(),
                CellValue::Int(10),
                CellValue::Int(10),
                "300".into(),
                "1000".into(),
            ]],
        )
        .unwrap();
        let mapping = ColumnMapping {
            promedio_mes_und: "prom".to_string(),
            dias_actividad: "dias".to_string(),
            precio_venta: "pvp".to_string(),
        };

        let result = InsumoProcessor::new(mapping)
            .with_options(PipelineOptions {
                compute_days: false,
            })
            .process(&table, 10.0)
            .unwrap();
        assert_eq!(int(&result, columns::COSTO_DESCUENTO), 11000);
    }

    struct MockConfigReader;

    impl InsumoConfigReader for MockConfigReader {
        fn column_mapping(&self) -> ConfigResult<ColumnMapping> {
            Ok(ColumnMapping {
                precio_venta: "PVP".to_string(),
                ..ColumnMapping::default()
            })
        }
        fn insumo_columns(&self) -> ConfigResult<Vec<String>> {
            Ok(vec![])
        }
        fn default_range(&self) -> ConfigResult<DiscountRange> {
            Ok(DiscountRange::default())
        }
        fn growth_bounds(&self) -> ConfigResult<(f64, f64)> {
            Ok((0.0, 100.0))
        }
        fn preprocessor(&self) -> ConfigResult<PreprocessorConfig> {
            Ok(PreprocessorConfig::default())
        }
    }

    #[test]
    fn test_from_reader_uses_configured_columns() {
        let processor = InsumoProcessor::from_reader(&MockConfigReader).unwrap();
        assert_eq!(processor.columns().precio_venta, "PVP");
    }
}
