// ==========================================
// 折扣测算系统 - 列拼接
// ==========================================
// 职责: 多列拼接为组合键列（如 plu : producto）
// 规则: Null → ""，不丢行；输出列已存在时原位覆盖
// ==========================================

use crate::domain::table::{Table, TableResult};

/// 拼接 columns 到 output 列，返回新表
///
/// separator 为 None 时直接相连
pub fn concat_columns<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    output: &str,
    separator: Option<&str>,
) -> TableResult<Table> {
    let indexes = table.require_columns(columns)?;
    let sep = separator.unwrap_or("");

    let mut result = table.clone();
    result.derive_column(output, |_, row| {
        indexes
            .iter()
            .map(|&idx| row[idx].to_text_or_empty())
            .collect::<Vec<_>>()
            .join(sep)
            .into()
    })?;
    Ok(result)
}
