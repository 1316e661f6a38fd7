// ==========================================
// 缴费申报系统 - 行规范化器实现
// ==========================================
// 职责: 原始单元格 → WorkerRecord + 类型转换
// 日期: 序列号（1899-12-30 起算）或文本（候选格式依次尝试）
// 金额: 本地格式文本（"2.500,50"）或数字，按精度四舍五入
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::{CellValue, DateField, Header};
use crate::domain::worker::{columns, WorkerRecord};
use crate::importer::planilla_importer_trait::RowMapper;
use chrono::{Duration, NaiveDate};

/// 表格日期序列号起点（序列号 1 = 1899-12-31）
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub struct RowNormalizer {
    decimal_precision: u32,
    date_formats: Vec<String>,
}

impl RowNormalizer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            decimal_precision: config.decimal_precision,
            date_formats: config.date_formats.clone(),
        }
    }

    /// 按表头顺序映射一行
    ///
    /// 超出表头的单元格忽略；缺失的尾部单元格视为空
    pub fn normalize(&self, row: &[CellValue], header: &Header, row_number: usize) -> WorkerRecord {
        let mut record = WorkerRecord {
            row_number,
            ..WorkerRecord::default()
        };

        for (idx, column) in header.columns().iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let cell = row.get(idx).unwrap_or(&CellValue::Empty);

            match column.as_str() {
                columns::FECHA_INGRESO => record.fecha_ingreso = self.parse_date(cell),
                columns::FECHA_RETIRO => record.fecha_retiro = self.parse_date(cell),
                columns::NRO => record.nro = cell.as_text(),
                columns::NUMERO_DOCUMENTO => record.numero_documento = cell.as_text(),
                columns::NOMBRES => record.nombres = cell.as_text(),
                columns::APELLIDO_PATERNO => record.apellido_paterno = cell.as_text(),
                columns::APELLIDO_MATERNO => record.apellido_materno = cell.as_text(),
                columns::REGIONAL => record.regional = cell.as_text(),
                other => {
                    let amount = self.parse_amount(cell);
                    if !record.set_amount(other, amount) {
                        record.extra.insert(other.to_string(), cell.clone());
                    }
                }
            }
        }

        record
    }

    /// 解析日期单元格
    ///
    /// # 返回
    /// - None: 空单元格
    /// - Some(Value): 解析成功
    /// - Some(Invalid): 非空但无法识别
    pub fn parse_date(&self, cell: &CellValue) -> Option<DateField> {
        match cell {
            CellValue::Empty => None,
            CellValue::Number(serial) => Some(
                serial_to_date(*serial)
                    .map(DateField::Value)
                    .unwrap_or_else(|| DateField::Invalid(cell.to_string())),
            ),
            CellValue::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let parsed = self
                    .date_formats
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok());
                Some(match parsed {
                    Some(date) => DateField::Value(date),
                    None => DateField::Invalid(trimmed.to_string()),
                })
            }
            CellValue::Bool(b) => Some(DateField::Invalid(b.to_string())),
        }
    }

    /// 解析金额单元格（无法解析/非有限值/空值/布尔 → 0.0）
    pub fn parse_amount(&self, cell: &CellValue) -> f64 {
        match cell {
            CellValue::Number(n) if n.is_finite() => self.round(*n),
            CellValue::Number(_) => 0.0,
            CellValue::Text(raw) => parse_localized_number(raw)
                .map(|n| self.round(n))
                .unwrap_or(0.0),
            CellValue::Empty | CellValue::Bool(_) => 0.0,
        }
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimal_precision as i32);
        (value * factor).round() / factor
    }
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl RowMapper for RowNormalizer {
    fn map_row(&self, row: &[CellValue], header: &Header, row_number: usize) -> WorkerRecord {
        self.normalize(row, header, row_number)
    }
}

/// 序列号 → 日期（取整数部分，时间部分舍去）
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    let days = serial.floor();
    if days.abs() > 3_000_000.0 {
        return None;
    }
    epoch.checked_add_signed(Duration::days(days as i64))
}

/// 本地格式数字文本: 去空白 → 删除所有 "." → 首个 "," 改为 "."
///
/// "2.500,50" → 2500.5；"1.234.567" → 1234567
/// 整串必须是数字: "12abc"、"NaN"、"inf" → None
fn parse_localized_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();
    if compact.is_empty() {
        return None;
    }
    compact
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
