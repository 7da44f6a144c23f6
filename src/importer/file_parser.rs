// ==========================================
// 折扣测算系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)，文件路径或上传缓冲区
// 规则: 所有单元格按文本读取；TRIM；整行空白跳过
// ==========================================

use crate::domain::table::{CellValue, Table};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table_parser_trait::TableParser;
use calamine::{open_workbook, open_workbook_from_rs, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

/// 按表头 + 原始文本行组装表格；可选择只保留部分列
fn assemble_table(
    source: &str,
    headers: Vec<String>,
    raw_rows: Vec<Vec<String>>,
    use_cols: Option<&[String]>,
) -> ImportResult<Table> {
    // 确定保留的列下标
    let selected: Vec<(usize, String)> = match use_cols {
        Some(cols) => cols
            .iter()
            .map(|c| {
                headers
                    .iter()
                    .position(|h| h == c)
                    .map(|idx| (idx, c.clone()))
                    .ok_or_else(|| ImportError::MissingSelectedColumn(c.clone()))
            })
            .collect::<ImportResult<_>>()?,
        None => headers.iter().cloned().enumerate().collect(),
    };

    let mut table = Table::new(selected.iter().map(|(_, h)| h.clone()));
    let mut skipped = 0usize;

    for raw in raw_rows {
        let row: Vec<CellValue> = selected
            .iter()
            .map(|(idx, _)| {
                raw.get(*idx)
                    .map(|v| CellValue::from_raw(v))
                    .unwrap_or(CellValue::Null)
            })
            .collect();

        // 跳过完全空白的行
        if row.iter().all(CellValue::is_null) {
            skipped += 1;
            continue;
        }
        table.push_row(row)?;
    }

    debug!(source, rows = table.len(), skipped, "表格组装完成");
    Ok(table)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    fn parse_reader<R: Read>(&self, source: &str, reader: R) -> ImportResult<Table> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut raw_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            raw_rows.push(record.iter().map(str::to_string).collect());
        }

        assemble_table(source, headers, raw_rows, None)
    }
}

impl TableParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<Table> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = extension_of(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let table = self.parse_reader(&path.display().to_string(), file)?;
        info!(file = %path.display(), rows = table.len(), "CSV 解析完成");
        Ok(table)
    }

    fn parse_bytes(&self, name: &str, bytes: &[u8]) -> ImportResult<Table> {
        self.parse_reader(name, bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读第一个 sheet；use_cols 限定读取的列子集
#[derive(Default)]
pub struct ExcelParser {
    use_cols: Option<Vec<String>>,
}

impl ExcelParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(use_cols: Vec<String>) -> Self {
        Self {
            use_cols: Some(use_cols),
        }
    }

    fn read_workbook<RS: Read + Seek>(
        &self,
        source: &str,
        mut workbook: Xlsx<RS>,
    ) -> ImportResult<Table> {
        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::EmptyFile(source.to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let raw_rows = rows
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        assemble_table(source, headers, raw_rows, self.use_cols.as_deref())
    }
}

impl TableParser for ExcelParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<Table> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = extension_of(path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let workbook: Xlsx<_> = open_workbook(path)?;
        let table = self.read_workbook(&path.display().to_string(), workbook)?;
        info!(file = %path.display(), rows = table.len(), "Excel 解析完成");
        Ok(table)
    }

    fn parse_bytes(&self, name: &str, bytes: &[u8]) -> ImportResult<Table> {
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
        self.read_workbook(name, workbook)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Default)]
pub struct UniversalFileParser {
    excel_columns: Option<Vec<String>>,
}

impl UniversalFileParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// XLSX 读取时只保留的列（CSV 不受影响）
    pub fn with_excel_columns(excel_columns: Vec<String>) -> Self {
        Self {
            excel_columns: Some(excel_columns),
        }
    }

    fn excel_parser(&self) -> ExcelParser {
        match &self.excel_columns {
            Some(cols) => ExcelParser::with_columns(cols.clone()),
            None => ExcelParser::new(),
        }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Table> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_file(path),
            "xlsx" => self.excel_parser().parse_file(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// 上传缓冲区按文件名后缀分派
    pub fn parse_upload(&self, name: &str, bytes: &[u8]) -> ImportResult<Table> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            CsvParser.parse_bytes(name, bytes)
        } else if lower.ends_with(".xlsx") {
            self.excel_parser().parse_bytes(name, bytes)
        } else {
            Err(ImportError::UnsupportedFormat(name.to_string()))
        }
    }
}
