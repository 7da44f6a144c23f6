// ==========================================
// 折扣测算系统 - JSON 行数据解析
// ==========================================
// 输入: JSON 数组的数组，第一行为表头
// 约束: 至少 2 行（表头 + 1 行数据）
// ==========================================

use crate::domain::table::{CellValue, Table};
use crate::importer::error::{ImportError, ImportResult};
use serde_json::Value;
use tracing::debug;

pub struct JsonRowsParser;

impl JsonRowsParser {
    /// 解析 JSON 文本
    pub fn parse_str(&self, text: &str) -> ImportResult<Table> {
        let value: Value = serde_json::from_str(text)?;
        self.parse_value(&value)
    }

    /// 解析已反序列化的 JSON 值（远程接口返回体）
    pub fn parse_value(&self, value: &Value) -> ImportResult<Table> {
        let rows = value.as_array().ok_or_else(|| {
            ImportError::JsonParseError("顶层必须是数组".to_string())
        })?;

        if rows.len() < 2 {
            return Err(ImportError::EmptyFile(format!(
                "JSON 至少需要 2 行，实际 {} 行",
                rows.len()
            )));
        }

        let header_row = rows[0]
            .as_array()
            .ok_or_else(|| ImportError::JsonParseError("表头行必须是数组".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|h| json_to_cell(h).to_text_or_empty())
            .collect();

        let mut table = Table::new(headers.clone());
        for (i, row) in rows.iter().enumerate().skip(1) {
            let cells = row.as_array().ok_or_else(|| {
                ImportError::JsonParseError(format!("第 {} 行不是数组", i + 1))
            })?;
            // 短行补 Null，长行截断
            let record = (0..headers.len())
                .map(|idx| cells.get(idx).map(json_to_cell).unwrap_or_default())
                .collect();
            table.push_row(record)?;
        }

        debug!(rows = table.len(), cols = headers.len(), "JSON 行数据解析完成");
        Ok(table)
    }
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::String(s) => CellValue::from_raw(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or_default(),
        },
        Value::Bool(b) => CellValue::text(b.to_string()),
        other => CellValue::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_with_header() {
        let table = JsonRowsParser
            .parse_str(r#"[["plu","producto","precio"],["1001","Arroz",2500],[1002,null,3200.5]]"#)
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "precio").unwrap(), &CellValue::Int(2500));
        assert_eq!(table.value(1, "plu").unwrap(), &CellValue::Int(1002));
        assert_eq!(table.value(1, "producto").unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_header_only_is_rejected() {
        let result = JsonRowsParser.parse_str(r#"[["plu","producto"]]"#);
        assert!(matches!(result, Err(ImportError::EmptyFile(_))));
    }

    #[test]
    fn test_non_array_is_rejected() {
        let result = JsonRowsParser.parse_str(r#"{"plu": 1}"#);
        assert!(matches!(result, Err(ImportError::JsonParseError(_))));

        let result = JsonRowsParser.parse_str("not json");
        assert!(matches!(result, Err(ImportError::JsonParseError(_))));
    }
}
