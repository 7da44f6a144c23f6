// ==========================================
// 折扣测算系统 - 表格模型
// ==========================================
// 职责: 行 × 命名列 的内存表格，承载导入数据与计算结果
// 约束: 每行单元格数 == 列数；变换一律返回新表，原表不变
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

// ==========================================
// 表格错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("列不存在: '{column}'")]
    MissingColumn { column: String },

    #[error("列已存在: '{0}'")]
    DuplicateColumn(String),

    #[error("行长度不一致 (行 {row}): 期望 {expected} 列，实际 {actual} 列")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("列长度不一致 (列 {column}): 期望 {expected} 行，实际 {actual} 行")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl TableError {
    pub fn missing(column: impl Into<String>) -> Self {
        TableError::MissingColumn {
            column: column.into(),
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 空字符串视为 Null（与导入时的 NULL 标准化一致）
    pub fn from_raw(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// NaN 也视为空值
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// 数值读取；文本单元格按浮点数解析
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) if v.is_nan() => None,
            CellValue::Float(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        }
    }

    /// 整数读取；"2024" 与 "2024.0" 都能解析，带小数部分的值不接受
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            _ => self
                .as_f64()
                .filter(|v| v.fract() == 0.0 && v.is_finite())
                .map(|v| v as i64),
        }
    }

    /// 用于拼接/分组/关联的字符串形式；Null → None
    pub fn as_key(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// 拼接语义: Null → ""
    pub fn to_text_or_empty(&self) -> String {
        self.as_key().unwrap_or_default()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

static NULL_CELL: CellValue = CellValue::Null;

// ==========================================
// Table - 内存表格
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// 创建空表（仅表头）
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 由表头 + 行数据创建，校验每行长度
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<CellValue>>,
    ) -> TableResult<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// 由 HashMap 行记录创建（列顺序以 headers 为准，缺失键记为 Null）
    pub fn from_records(headers: &[String], records: Vec<HashMap<String, String>>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| {
                        record
                            .get(h)
                            .map(|v| CellValue::from_raw(v))
                            .unwrap_or(CellValue::Null)
                    })
                    .collect()
            })
            .collect();
        Self {
            columns: headers.to_vec(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 取列下标，不存在时返回 MissingColumn
    pub fn require_column(&self, name: &str) -> TableResult<usize> {
        self.column_index(name).ok_or_else(|| TableError::missing(name))
    }

    /// 批量校验列存在性，返回下标（顺序与入参一致）
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> TableResult<Vec<usize>> {
        names
            .iter()
            .map(|n| self.require_column(n.as_ref()))
            .collect()
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> TableResult<()> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLengthMismatch {
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// 读取单元格（行下标从 0 开始）
    pub fn value(&self, row: usize, column: &str) -> TableResult<&CellValue> {
        let idx = self.require_column(column)?;
        Ok(self
            .rows
            .get(row)
            .and_then(|r| r.get(idx))
            .unwrap_or(&NULL_CELL))
    }

    pub fn column_values(&self, column: &str) -> TableResult<Vec<&CellValue>> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// 去重后的列值（保持首次出现顺序，忽略 Null）
    pub fn unique_values(&self, column: &str) -> TableResult<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        Ok(self
            .column_values(column)?
            .into_iter()
            .filter_map(|v| v.as_key())
            .filter(|v| seen.insert(v.clone()))
            .collect())
    }

    /// 新增或覆盖一列
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) -> TableResult<()> {
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLengthMismatch {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// 对每行计算新值写入指定列（新增或覆盖）
    pub fn derive_column<F>(&mut self, name: &str, mut f: F) -> TableResult<()>
    where
        F: FnMut(usize, &[CellValue]) -> CellValue,
    {
        let values = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| f(i, row))
            .collect();
        self.set_column(name, values)
    }

    /// 可失败版本: 任一行出错即整体失败，表不被修改
    pub fn try_derive_column<F, E>(&mut self, name: &str, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize, &[CellValue]) -> Result<CellValue, E>,
        E: From<TableError>,
    {
        let values = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| f(i, row))
            .collect::<Result<Vec<_>, E>>()?;
        self.set_column(name, values)?;
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> TableResult<()> {
        let idx = self.require_column(name)?;
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> TableResult<()> {
        let idx = self.require_column(from)?;
        if from != to && self.has_column(to) {
            return Err(TableError::DuplicateColumn(to.to_string()));
        }
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// 按谓词保留行，返回新表
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// 删除指定下标的行（越界返回 None）
    pub fn remove_row(&mut self, index: usize) -> Option<Vec<CellValue>> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }

    /// 行迭代为 列名 → 值 的映射（用于序列化 / 调试输出）
    pub fn to_records(&self) -> Vec<HashMap<String, CellValue>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["plu", "producto", "precio"],
            vec![
                vec!["1001".into(), "Arroz".into(), "2500".into()],
                vec!["1002".into(), CellValue::Null, CellValue::Float(3200.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_require_column_missing() {
        let table = sample();
        assert_eq!(
            table.require_column("marca"),
            Err(TableError::missing("marca"))
        );
        assert!(table.require_columns(&["plu", "precio"]).is_ok());
    }

    #[test]
    fn test_push_row_length_mismatch() {
        let mut table = sample();
        let result = table.push_row(vec!["1003".into()]);
        assert!(matches!(
            result,
            Err(TableError::RowLengthMismatch {
                expected: 3,
                actual: 1,
                ..
            })
        ));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cell_numeric_reads() {
        assert_eq!(CellValue::text("300").as_f64(), Some(300.0));
        assert_eq!(CellValue::text(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(CellValue::text("abc").as_f64(), None);
        assert_eq!(CellValue::text("2024.0").as_i64(), Some(2024));
        assert_eq!(CellValue::text("2024.5").as_i64(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert!(CellValue::Float(f64::NAN).is_null());
    }

    #[test]
    fn test_set_column_add_and_overwrite() {
        let mut table = sample();
        table
            .set_column("flag", vec![CellValue::Int(1), CellValue::Int(0)])
            .unwrap();
        assert_eq!(table.columns().len(), 4);

        table
            .set_column("flag", vec![CellValue::Int(7), CellValue::Int(8)])
            .unwrap();
        assert_eq!(table.columns().len(), 4);
        assert_eq!(table.value(0, "flag").unwrap(), &CellValue::Int(7));
    }

    #[test]
    fn test_try_derive_column_leaves_table_untouched_on_error() {
        let mut table = sample();
        let result: Result<(), TableError> = table.try_derive_column("x", |i, _| {
            if i == 1 {
                Err(TableError::missing("boom"))
            } else {
                Ok(CellValue::Int(1))
            }
        });
        assert!(result.is_err());
        assert!(!table.has_column("x"));
    }

    #[test]
    fn test_unique_values_skip_null() {
        let table = sample();
        assert_eq!(
            table.unique_values("producto").unwrap(),
            vec!["Arroz".to_string()]
        );
    }

    #[test]
    fn test_rename_to_existing_column_rejected() {
        let mut table = sample();
        assert!(table.rename_column("plu", "precio").is_err());
        table.rename_column("plu", "codigo").unwrap();
        assert!(table.has_column("codigo"));
    }
}
