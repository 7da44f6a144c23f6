// ==========================================
// 折扣测算系统 - 表格变换
// ==========================================
// 职责: 左关联 / 选列 / 重命名 / 按值过滤 / 映射替换 / 分组聚合 / 宽转长
// 规则: 所有变换返回新表，入参表不变
// ==========================================

use crate::domain::table::{CellValue, Table, TableError, TableResult};
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// 关联键: Null 与 Null 视为相同
type JoinKey = Vec<Option<String>>;

fn key_of(row: &[CellValue], indexes: &[usize]) -> JoinKey {
    indexes.iter().map(|&i| row[i].as_key()).collect()
}

// ==========================================
// 左关联
// ==========================================

/// 以 on 列左关联 right；左表行全部保留
///
/// - 右表匹配多行时左行被复制（与右表行一一组合）
/// - 无匹配时右表列为 Null
/// - 非键同名列加后缀 _x（左）/ _y（右）
pub fn left_join<S: AsRef<str>>(left: &Table, right: &Table, on: &[S]) -> TableResult<Table> {
    let left_keys = left.require_columns(on)?;
    let right_keys = right.require_columns(on)?;

    let right_extra: Vec<usize> = (0..right.columns().len())
        .filter(|i| !right_keys.contains(i))
        .collect();

    // 输出列名
    let on_names: HashSet<&str> = on.iter().map(AsRef::as_ref).collect();
    let right_names: HashSet<&str> = right_extra
        .iter()
        .map(|&i| right.columns()[i].as_str())
        .collect();
    let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| {
            if !on_names.contains(c.as_str()) && right_names.contains(c.as_str()) {
                format!("{}_x", c)
            } else {
                c.clone()
            }
        })
        .collect();
    columns.extend(right_extra.iter().map(|&i| {
        let c = &right.columns()[i];
        if left_names.contains(c.as_str()) {
            format!("{}_y", c)
        } else {
            c.clone()
        }
    }));

    // 右表索引
    let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        index.entry(key_of(row, &right_keys)).or_default().push(i);
    }

    let mut rows = Vec::with_capacity(left.len());
    for row in left.rows() {
        match index.get(&key_of(row, &left_keys)) {
            Some(matches) => {
                for &m in matches {
                    let mut out = row.clone();
                    out.extend(right_extra.iter().map(|&i| right.rows()[m][i].clone()));
                    rows.push(out);
                }
            }
            None => {
                let mut out = row.clone();
                out.extend(right_extra.iter().map(|_| CellValue::Null));
                rows.push(out);
            }
        }
    }

    debug!(left = left.len(), right = right.len(), result = rows.len(), "左关联完成");
    Table::from_rows(columns, rows)
}

// ==========================================
// 选列 / 重命名
// ==========================================

/// 按给定顺序只保留指定列
pub fn select<S: AsRef<str>>(table: &Table, columns: &[S]) -> TableResult<Table> {
    let indexes = table.require_columns(columns)?;
    let rows = table
        .rows()
        .iter()
        .map(|row| indexes.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Table::from_rows(columns.iter().map(|c| c.as_ref().to_string()), rows)
}

/// 批量重命名；映射中不存在于表中的列被忽略
pub fn rename_columns(table: &Table, mapping: &[(String, String)]) -> TableResult<Table> {
    let mut renamed = table.clone();
    for (from, to) in mapping {
        if renamed.has_column(from) {
            renamed.rename_column(from, to)?;
        }
    }
    Ok(renamed)
}

// ==========================================
// 过滤 / 替换
// ==========================================

/// include=true 保留值在 values 中的行；false 则剔除
pub fn filter_by_values<S: AsRef<str>>(
    table: &Table,
    column: &str,
    values: &[S],
    include: bool,
) -> TableResult<Table> {
    let idx = table.require_column(column)?;
    let wanted: HashSet<&str> = values.iter().map(AsRef::as_ref).collect();

    Ok(table.filter_rows(|row| {
        let hit = row[idx]
            .as_key()
            .map(|k| wanted.contains(k.as_str()))
            .unwrap_or(false);
        hit == include
    }))
}

/// 参考列值在 mapping 中时，用映射值替换目标列；否则保留原值
pub fn replace_by_mapping(
    table: &Table,
    target: &str,
    reference: &str,
    mapping: &HashMap<String, String>,
) -> TableResult<Table> {
    let target_idx = table.require_column(target)?;
    let ref_idx = table.require_column(reference)?;

    let mut result = table.clone();
    result.derive_column(target, |_, row| {
        row[ref_idx]
            .as_key()
            .and_then(|k| mapping.get(&k))
            .map(|v| CellValue::text(v.clone()))
            .unwrap_or_else(|| row[target_idx].clone())
    })?;
    Ok(result)
}

// ==========================================
// 分组聚合
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggOp {
    Sum,
    Mean,
    Count,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// 按 keys 分组，对 measures 执行 op
///
/// - 任一键为 Null 的行不参与分组
/// - 输出按键升序
/// - Sum/Mean 只统计非空值；全空分组的 Mean 为 Null
pub fn group_by<S: AsRef<str>, M: AsRef<str>>(
    table: &Table,
    keys: &[S],
    measures: &[M],
    op: AggOp,
) -> EngineResult<Table> {
    let key_idx = table.require_columns(keys)?;
    let measure_idx = table.require_columns(measures)?;

    let mut groups: BTreeMap<Vec<String>, (Vec<CellValue>, Vec<Accumulator>)> = BTreeMap::new();

    for (row_no, row) in table.rows().iter().enumerate() {
        let key: Option<Vec<String>> = key_idx.iter().map(|&i| row[i].as_key()).collect();
        let Some(key) = key else { continue };

        let (_, accs) = groups.entry(key).or_insert_with(|| {
            (
                key_idx.iter().map(|&i| row[i].clone()).collect(),
                measure_idx.iter().map(|_| Accumulator::default()).collect(),
            )
        });

        for (acc, (&idx, name)) in accs.iter_mut().zip(measure_idx.iter().zip(measures)) {
            let cell = &row[idx];
            if cell.is_null() {
                continue;
            }
            if op != AggOp::Count {
                acc.sum += cell.as_f64().ok_or_else(|| EngineError::InvalidNumber {
                    row: row_no + 1,
                    column: name.as_ref().to_string(),
                    value: cell.to_string(),
                })?;
            }
            acc.count += 1;
        }
    }

    let columns = keys
        .iter()
        .map(|k| k.as_ref().to_string())
        .chain(measures.iter().map(|m| m.as_ref().to_string()));

    let rows = groups
        .into_values()
        .map(|(mut key_cells, accs)| {
            key_cells.extend(accs.into_iter().map(|acc| match op {
                AggOp::Sum => CellValue::Float(acc.sum),
                AggOp::Mean if acc.count == 0 => CellValue::Null,
                AggOp::Mean => CellValue::Float(acc.sum / acc.count as f64),
                AggOp::Count => CellValue::Int(acc.count as i64),
            }));
            key_cells
        })
        .collect();

    Ok(Table::from_rows(columns, rows)?)
}

// ==========================================
// 宽表 → 长表
// ==========================================

pub const MELT_VAR_NAME: &str = "Material";
pub const MELT_VALUE_NAME: &str = "Cantidad";

/// 保留 id_columns，其余列展开为 (Material, Cantidad) 行
///
/// 输出顺序: 先按被展开列，再按原行序
pub fn melt<S: AsRef<str>>(table: &Table, id_columns: &[S]) -> TableResult<Table> {
    let id_idx = table.require_columns(id_columns)?;
    let value_idx: Vec<usize> = (0..table.columns().len())
        .filter(|i| !id_idx.contains(i))
        .collect();

    let mut columns: Vec<String> = id_columns.iter().map(|c| c.as_ref().to_string()).collect();
    if columns.iter().any(|c| c == MELT_VAR_NAME || c == MELT_VALUE_NAME) {
        return Err(TableError::DuplicateColumn(MELT_VAR_NAME.to_string()));
    }
    columns.push(MELT_VAR_NAME.to_string());
    columns.push(MELT_VALUE_NAME.to_string());

    let mut rows = Vec::with_capacity(table.len() * value_idx.len());
    for &v in &value_idx {
        let var = CellValue::text(table.columns()[v].clone());
        for row in table.rows() {
            let mut out: Vec<CellValue> = id_idx.iter().map(|&i| row[i].clone()).collect();
            out.push(var.clone());
            out.push(row[v].clone());
            rows.push(out);
        }
    }

    Table::from_rows(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> Table {
        Table::from_rows(
            ["plu", "producto", "ventas"],
            vec![
                vec!["1001".into(), "Arroz".into(), "10".into()],
                vec!["1002".into(), "Frijol".into(), "20".into()],
                vec!["1003".into(), "Lenteja".into(), CellValue::Null],
            ],
        )
        .unwrap()
    }

    fn prices() -> Table {
        Table::from_rows(
            ["plu", "precio", "ventas"],
            vec![
                vec![CellValue::Int(1001), CellValue::Float(2500.0), "x".into()],
                vec![CellValue::Int(1002), CellValue::Float(3200.0), "y".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_left_join_preserves_left_rows_with_unique_right_keys() {
        let joined = left_join(&products(), &prices(), &["plu"]).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(
            joined.columns(),
            &["plu", "producto", "ventas_x", "precio", "ventas_y"]
        );
        assert_eq!(joined.value(0, "precio").unwrap(), &CellValue::Float(2500.0));
        assert_eq!(joined.value(2, "precio").unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_left_join_duplicates_on_repeated_right_keys() {
        let mut right = prices();
        right
            .push_row(vec![CellValue::Int(1001), CellValue::Float(2600.0), "z".into()])
            .unwrap();
        let joined = left_join(&products(), &right, &["plu"]).unwrap();
        assert_eq!(joined.len(), 4);
    }

    #[test]
    fn test_left_join_requires_keys_in_both_tables() {
        let result = left_join(&products(), &prices(), &["producto"]);
        assert_eq!(result, Err(TableError::missing("producto")));
    }

    #[test]
    fn test_select_and_rename() {
        let selected = select(&products(), &["producto", "plu"]).unwrap();
        assert_eq!(selected.columns(), &["producto", "plu"]);

        let renamed = rename_columns(
            &selected,
            &[
                ("plu".to_string(), "Codigo".to_string()),
                ("marca".to_string(), "Marca".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(renamed.columns(), &["producto", "Codigo"]);
    }

    #[test]
    fn test_filter_by_values_include_and_exclude() {
        let kept = filter_by_values(&products(), "plu", &["1001", "1003"], true).unwrap();
        assert_eq!(kept.len(), 2);

        let dropped = filter_by_values(&products(), "plu", &["1001"], false).unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped.value(0, "plu").unwrap(), &CellValue::text("1002"));
    }

    #[test]
    fn test_replace_by_mapping() {
        let mapping = HashMap::from([("Frijol".to_string(), "9999".to_string())]);
        let result = replace_by_mapping(&products(), "plu", "producto", &mapping).unwrap();

        assert_eq!(result.value(0, "plu").unwrap(), &CellValue::text("1001"));
        assert_eq!(result.value(1, "plu").unwrap(), &CellValue::text("9999"));
    }

    #[test]
    fn test_group_by_sorted_with_ops() {
        let table = Table::from_rows(
            ["linea", "ventas"],
            vec![
                vec!["B".into(), "4".into()],
                vec!["A".into(), "1".into()],
                vec!["B".into(), CellValue::Null],
                vec!["A".into(), "3".into()],
                vec![CellValue::Null, "100".into()],
            ],
        )
        .unwrap();

        let sum = group_by(&table, &["linea"], &["ventas"], AggOp::Sum).unwrap();
        assert_eq!(sum.len(), 2);
        assert_eq!(sum.value(0, "linea").unwrap(), &CellValue::text("A"));
        assert_eq!(sum.value(0, "ventas").unwrap(), &CellValue::Float(4.0));

        let mean = group_by(&table, &["linea"], &["ventas"], AggOp::Mean).unwrap();
        assert_eq!(mean.value(1, "ventas").unwrap(), &CellValue::Float(4.0));

        let count = group_by(&table, &["linea"], &["ventas"], AggOp::Count).unwrap();
        assert_eq!(count.value(1, "ventas").unwrap(), &CellValue::Int(1));
    }

    #[test]
    fn test_group_by_rejects_non_numeric_measure() {
        let table = Table::from_rows(["k", "v"], vec![vec!["a".into(), "abc".into()]]).unwrap();
        let result = group_by(&table, &["k"], &["v"], AggOp::Sum);
        assert!(matches!(
            result,
            Err(EngineError::InvalidNumber { row: 1, .. })
        ));
    }

    #[test]
    fn test_melt() {
        let wide = Table::from_rows(
            ["fecha", "Arroz", "Frijol"],
            vec![
                vec!["2025-01".into(), CellValue::Int(1), CellValue::Int(2)],
                vec!["2025-02".into(), CellValue::Int(3), CellValue::Int(4)],
            ],
        )
        .unwrap();

        let long = melt(&wide, &["fecha"]).unwrap();
        assert_eq!(long.columns(), &["fecha", MELT_VAR_NAME, MELT_VALUE_NAME]);
        assert_eq!(long.len(), 4);
        assert_eq!(long.value(2, MELT_VAR_NAME).unwrap(), &CellValue::text("Frijol"));
        assert_eq!(long.value(2, MELT_VALUE_NAME).unwrap(), &CellValue::Int(2));
    }
}
