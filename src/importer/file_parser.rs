// ==========================================
// 缴费申报系统 - 表格读取器实现
// ==========================================
// 职责: 二进制表格文件 → RawGrid（行 × 列原始单元格）
// 支持: Excel (.xlsx/.xlsm/.xls) / OpenDocument (.ods) / CSV (.csv)
// 说明: 仅读取第一个工作表；第 0 行为表头
// ==========================================

use crate::domain::types::{CellValue, RawGrid};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::planilla_importer_trait::FileParser;
use calamine::{Data, Ods, Reader, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

// ==========================================
// ReadOptions - 读取参数
// ==========================================
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// ISO 日期单元格渲染为文本时使用的格式（chrono 格式串）
    pub date_display_format: String,
    /// CSV 分隔符，None 时按首行自动识别（',' 或 ';'）
    pub csv_delimiter: Option<u8>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            date_display_format: crate::config::import_config::DEFAULT_DATE_DISPLAY_FORMAT
                .to_string(),
            csv_delimiter: None,
        }
    }
}

impl ReadOptions {
    pub fn with_date_display_format(format: &str) -> Self {
        Self {
            date_display_format: format.to_string(),
            ..Self::default()
        }
    }
}

// ==========================================
// SheetFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl SheetFormat {
    /// 根据文件名扩展名识别格式（忽略大小写）
    pub fn from_file_name(file_name: &str) -> ImporterResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "ods" => Ok(SheetFormat::Ods),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_grid(&self, bytes: &[u8], options: &ReadOptions) -> ImporterResult<RawGrid> {
        let delimiter = options
            .csv_delimiter
            .unwrap_or_else(|| detect_delimiter(bytes));

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(bytes);

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    }
                })
                .collect();
            grid.push(row);
        }

        Ok(grid)
    }
}

/// 按首行识别分隔符: ';' 多于 ',' 时使用 ';'
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser {
    format: SheetFormat,
}

impl ExcelParser {
    pub fn new(format: SheetFormat) -> Self {
        Self { format }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_grid(&self, bytes: &[u8], options: &ReadOptions) -> ImporterResult<RawGrid> {
        let cursor = Cursor::new(bytes);
        match self.format {
            SheetFormat::Xlsx => {
                let workbook: Xlsx<_> = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                first_sheet_grid(workbook, options)
            }
            SheetFormat::Xls => {
                let workbook: Xls<_> =
                    Xls::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                first_sheet_grid(workbook, options)
            }
            SheetFormat::Ods => {
                let workbook: Ods<_> =
                    Ods::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                first_sheet_grid(workbook, options)
            }
            SheetFormat::Csv => CsvParser.parse_to_grid(bytes, options),
        }
    }
}

/// 读取第一个工作表为 RawGrid
fn first_sheet_grid<RS, R>(mut workbook: R, options: &ReadOptions) -> ImporterResult<RawGrid>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::ExcelParseError("el libro no contiene hojas".to_string()))?
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    let grid: RawGrid = range
        .rows()
        .map(|row| row.iter().map(|cell| map_cell(cell, options)).collect())
        .collect();

    debug!(rows = grid.len(), "工作表读取完成");
    Ok(grid)
}

/// calamine 单元格 → CellValue
///
/// 日期单元格输出为序列号（Number），由行规范化器换算
fn map_cell(cell: &Data, options: &ReadOptions) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => render_iso_date(s, &options.date_display_format),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

/// ISO 日期文本 → 按显示格式渲染；无法识别时保留原文
fn render_iso_date(raw: &str, display_format: &str) -> CellValue {
    let trimmed = raw.trim();
    let date = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"));

    match date {
        Ok(d) => CellValue::Text(d.format(display_format).to_string()),
        Err(_) => CellValue::Text(raw.to_string()),
    }
}

// ==========================================
// GridReader - 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct GridReader;

impl GridReader {
    /// 从内存字节解析（文件名用于识别格式）
    ///
    /// # 返回
    /// - Ok(RawGrid): 第一个工作表的全部行，第 0 行为表头
    /// - Err: 格式不支持、文件损坏、工作表为空
    pub fn read_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
        options: &ReadOptions,
    ) -> ImporterResult<RawGrid> {
        let format = SheetFormat::from_file_name(file_name)?;
        let grid = match format {
            SheetFormat::Csv => CsvParser.parse_to_grid(bytes, options)?,
            other => ExcelParser::new(other).parse_to_grid(bytes, options)?,
        };

        if grid.is_empty() {
            let reason = "la hoja no contiene filas".to_string();
            return Err(match format {
                SheetFormat::Csv => ImportError::CsvParseError(reason),
                _ => ImportError::ExcelParseError(reason),
            });
        }

        Ok(grid)
    }

    /// 从文件路径解析
    pub fn read_path<P: AsRef<Path>>(
        &self,
        file_path: P,
        options: &ReadOptions,
    ) -> ImporterResult<RawGrid> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        // 先识别格式，避免读取不支持的文件
        SheetFormat::from_file_name(&file_name)?;

        let bytes = std::fs::read(path)?;
        self.read_bytes(&bytes, &file_name, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_parser_keeps_header_as_first_row() {
        let bytes = "Nro.,Nombres,Haber Básico\n1,Ana,\"2.500,00\"\n".as_bytes();

        let grid = CsvParser
            .parse_to_grid(bytes, &ReadOptions::default())
            .unwrap();

        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0], CellValue::Text("Nro.".to_string()));
        assert_eq!(grid[1][2], CellValue::Text("2.500,00".to_string()));
    }

    #[test]
    fn test_csv_parser_detects_semicolon_delimiter() {
        let bytes = "Nro.;Nombres;regional\n1;Ana;La Paz\n".as_bytes();

        let grid = CsvParser
            .parse_to_grid(bytes, &ReadOptions::default())
            .unwrap();

        assert_eq!(grid[0].len(), 3);
        assert_eq!(grid[1][2], CellValue::Text("La Paz".to_string()));
    }

    #[test]
    fn test_csv_parser_blank_cells_are_empty() {
        let bytes = "Nro.,Nombres\n,  \n".as_bytes();

        let grid = CsvParser
            .parse_to_grid(bytes, &ReadOptions::default())
            .unwrap();

        assert_eq!(grid[1], vec![CellValue::Empty, CellValue::Empty]);
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            SheetFormat::from_file_name("Planilla.XLSX").unwrap(),
            SheetFormat::Xlsx
        );
        assert_eq!(
            SheetFormat::from_file_name("p.csv").unwrap(),
            SheetFormat::Csv
        );
        assert!(matches!(
            SheetFormat::from_file_name("p.pdf"),
            Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn test_corrupt_xlsx_is_read_error() {
        let result = GridReader.read_bytes(
            b"definitely not a zip archive",
            "planilla.xlsx",
            &ReadOptions::default(),
        );
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_parse_path_file_not_found() {
        let result =
            GridReader.read_path("no_existe.xlsx", &ReadOptions::default());
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_path_reads_csv() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Nro.,Nombres").unwrap();
        writeln!(temp_file, "1,Ana").unwrap();

        let grid = GridReader
            .read_path(temp_file.path(), &ReadOptions::default())
            .unwrap();

        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_empty_csv_is_read_error() {
        let result = GridReader.read_bytes(b"", "vacia.csv", &ReadOptions::default());
        assert!(matches!(result, Err(ImportError::CsvParseError(_))));
    }

    #[test]
    fn test_render_iso_date_uses_display_format() {
        assert_eq!(
            render_iso_date("2024-02-01T00:00:00", "%d/%m/%Y"),
            CellValue::Text("01/02/2024".to_string())
        );
        assert_eq!(
            render_iso_date("not a date", "%d/%m/%Y"),
            CellValue::Text("not a date".to_string())
        );
    }
}
