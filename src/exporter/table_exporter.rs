// ==========================================
// 折扣测算系统 - 表格导出
// ==========================================
// XLSX: 单个工作表 "Datos"，首行表头，数值按数值写入
// CSV: 同样的列顺序，Null 写为空串
// ==========================================

use crate::domain::table::{CellValue, Table};
use crate::exporter::error::{ExportError, ExportResult};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

pub const SHEET_NAME: &str = "Datos";

fn fill_worksheet(worksheet: &mut Worksheet, table: &Table) -> ExportResult<()> {
    worksheet.set_name(SHEET_NAME)?;
    let header = Format::new().set_bold();

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, name, &header)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let excel_row = u32::try_from(r + 1)
            .map_err(|_| ExportError::TooLarge(format!("行数 {}", table.len())))?;
        for (c, cell) in row.iter().enumerate() {
            let excel_col = column_index(c)?;
            match cell {
                CellValue::Null => {}
                CellValue::Int(v) => {
                    worksheet.write_number(excel_row, excel_col, *v as f64)?;
                }
                CellValue::Float(v) if v.is_finite() => {
                    worksheet.write_number(excel_row, excel_col, *v)?;
                }
                CellValue::Float(_) => {}
                CellValue::Text(s) => {
                    worksheet.write_string(excel_row, excel_col, s)?;
                }
            }
        }
    }
    Ok(())
}

fn column_index(col: usize) -> ExportResult<u16> {
    u16::try_from(col).map_err(|_| ExportError::TooLarge(format!("列序号 {}", col)))
}

fn build_workbook(table: &Table) -> ExportResult<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_worksheet(worksheet, table)?;
    Ok(workbook)
}

/// 导出为 XLSX 文件
pub fn export_xlsx(table: &Table, path: &Path) -> ExportResult<()> {
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    info!(file = %path.display(), rows = table.len(), "XLSX 导出完成");
    Ok(())
}

/// 导出为 XLSX 字节（下载用）
pub fn export_xlsx_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

/// 导出为 CSV 文件
pub fn export_csv(table: &Table, path: &Path) -> ExportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(CellValue::to_text_or_empty))?;
    }
    writer.flush()?;
    info!(file = %path.display(), rows = table.len(), "CSV 导出完成");
    Ok(())
}
