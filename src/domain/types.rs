// ==========================================
// 缴费申报系统 - 领域类型定义
// ==========================================
// 职责: 原始单元格值、日期字段、申报类型等基础类型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 原始单元格值（未定型）
// ==========================================
// 序列化: null / number / string / bool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 空单元格或纯空白文本
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 转为去空白文本，空值返回 None
    ///
    /// 整数值的数字按整数输出（1.0 → "1"）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// 数字格式化（整数不带小数部分）
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

// ==========================================
// RawGrid / Header
// ==========================================
// RawGrid: 行 × 列，第 0 行为表头，仅在单次导入内存在
pub type RawGrid = Vec<Vec<CellValue>>;

/// 表头（有序列名）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// 从表头行构造
    ///
    /// 列名保留原文（不去首尾空白），"regional " 与 "regional" 是不同的列；
    /// 空单元格与纯空白单元格记为空列名
    pub fn from_row(row: &[CellValue]) -> Self {
        Self {
            columns: row
                .iter()
                .map(|cell| match cell {
                    CellValue::Text(s) if s.trim().is_empty() => String::new(),
                    CellValue::Text(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        }
    }

    /// 精确匹配（区分大小写）
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ==========================================
// DateField - 日期字段
// ==========================================
// Option<DateField>::None 表示缺失；Invalid 保留原始文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateField {
    Value(NaiveDate),
    Invalid(String),
}

impl DateField {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateField::Value(d) => Some(*d),
            DateField::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DateField::Value(_))
    }
}

// ==========================================
// 申报类型 (Tipo de planilla)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoPlanilla {
    #[serde(rename = "Mensual")]
    Mensual, // 月度申报
    #[serde(rename = "Reintegro")]
    Reintegro, // 补缴
    #[serde(rename = "Beneficio Social")]
    BeneficioSocial, // 社会福利
    #[serde(rename = "Planilla Adicional")]
    PlanillaAdicional, // 附加申报
}

impl TipoPlanilla {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoPlanilla::Mensual => "Mensual",
            TipoPlanilla::Reintegro => "Reintegro",
            TipoPlanilla::BeneficioSocial => "Beneficio Social",
            TipoPlanilla::PlanillaAdicional => "Planilla Adicional",
        }
    }

    /// 从字符串解析（忽略大小写与首尾空白）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mensual" => Some(TipoPlanilla::Mensual),
            "reintegro" => Some(TipoPlanilla::Reintegro),
            "beneficio social" => Some(TipoPlanilla::BeneficioSocial),
            "planilla adicional" => Some(TipoPlanilla::PlanillaAdicional),
            _ => None,
        }
    }
}

impl fmt::Display for TipoPlanilla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
