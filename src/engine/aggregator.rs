// ==========================================
// 折扣测算系统 - 汇总统计
// ==========================================
// 输出: 列名 → 整数汇总值（截断），空表为 0
// ==========================================

use crate::domain::table::Table;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;
use tracing::instrument;

/// 汇总结果（按列名有序）
pub type Totals = BTreeMap<String, i64>;

/// 逐列累加非空单元格
fn fold_column(table: &Table, column: &str) -> EngineResult<(f64, usize)> {
    let idx = table.require_column(column)?;
    let mut sum = 0.0;
    let mut count = 0;

    for (row_no, row) in table.rows().iter().enumerate() {
        let cell = &row[idx];
        if cell.is_null() {
            continue;
        }
        sum += cell.as_f64().ok_or_else(|| EngineError::InvalidNumber {
            row: row_no + 1,
            column: column.to_string(),
            value: cell.to_string(),
        })?;
        count += 1;
    }
    Ok((sum, count))
}

/// 各列求和后截断为整数
#[instrument(skip(table), fields(rows = table.len()))]
pub fn sum_columns<S: AsRef<str> + std::fmt::Debug>(
    table: &Table,
    columns: &[S],
) -> EngineResult<Totals> {
    columns
        .iter()
        .map(|c| {
            let (sum, _) = fold_column(table, c.as_ref())?;
            Ok((c.as_ref().to_string(), sum.trunc() as i64))
        })
        .collect()
}

/// 各列算术平均后截断为整数（无非空值时为 0）
#[instrument(skip(table), fields(rows = table.len()))]
pub fn mean_columns<S: AsRef<str> + std::fmt::Debug>(
    table: &Table,
    columns: &[S],
) -> EngineResult<Totals> {
    columns
        .iter()
        .map(|c| {
            let (sum, count) = fold_column(table, c.as_ref())?;
            let mean = if count == 0 { 0.0 } else { sum / count as f64 };
            Ok((c.as_ref().to_string(), mean.trunc() as i64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::CellValue;

    fn results() -> Table {
        Table::from_rows(
            ["Unidades", "Venta de la actividad"],
            vec![
                vec![CellValue::Int(100), CellValue::Float(110000.7)],
                vec![CellValue::Int(50), CellValue::Null],
                vec!["25".into(), CellValue::Float(2000.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sum_columns() {
        let totals = sum_columns(&results(), &["Unidades", "Venta de la actividad"]).unwrap();
        assert_eq!(totals["Unidades"], 175);
        assert_eq!(totals["Venta de la actividad"], 112001);
    }

    #[test]
    fn test_empty_table_yields_zero() {
        let empty = Table::new(["Unidades"]);
        let totals = sum_columns(&empty, &["Unidades"]).unwrap();
        assert_eq!(totals["Unidades"], 0);

        let means = mean_columns(&empty, &["Unidades"]).unwrap();
        assert_eq!(means["Unidades"], 0);
    }

    #[test]
    fn test_mean_columns_skip_nulls() {
        let means = mean_columns(&results(), &["Venta de la actividad"]).unwrap();
        assert_eq!(means["Venta de la actividad"], 56000);
    }

    #[test]
    fn test_missing_column() {
        let result = sum_columns(&results(), &["Costo"]);
        assert!(matches!(result, Err(ref e) if e.is_missing_column()));
    }
}
