// ==========================================
// 缴费申报系统 - 导入结果领域模型
// ==========================================
// 职责: 校验错误、汇总统计、导入结果
// 红线: 全有或全无，任何错误都拒绝整个导入
// ==========================================

use crate::domain::worker::WorkerRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// ValidationErrorKind - 校验错误类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    MissingColumn, // 表头缺少必需列
    RequiredField, // 必填字段为空
    InvalidDate,   // 日期格式错误
    InvalidNumber, // 金额非法或为负
    NoDataRows,    // 无有效数据行
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::MissingColumn => write!(f, "MISSING_COLUMN"),
            ValidationErrorKind::RequiredField => write!(f, "REQUIRED_FIELD"),
            ValidationErrorKind::InvalidDate => write!(f, "INVALID_DATE"),
            ValidationErrorKind::InvalidNumber => write!(f, "INVALID_NUMBER"),
            ValidationErrorKind::NoDataRows => write!(f, "NO_DATA_ROWS"),
        }
    }
}

// ==========================================
// ValidationError - 校验错误
// ==========================================
// row: 表格行号（表头为第 1 行，首个数据行为第 2 行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub field: Option<String>,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

// ==========================================
// ImportTotals - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportTotals {
    pub total_importe: f64,                  // 金额总计
    pub total_trabajadores: usize,           // 劳动者人数（有效 Nro.）
    pub por_columna: BTreeMap<String, f64>,  // 各金额列小计
}

// ==========================================
// ValidatedPlanilla - 校验通过的申报
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedPlanilla {
    pub import_id: String,           // 导入会话 ID（UUID）
    pub file_name: String,           // 源文件名
    pub records: Vec<WorkerRecord>,  // 校验通过的行
    pub totals: ImportTotals,        // 汇总统计
}

// ==========================================
// RejectionStage - 拒绝发生的阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionStage {
    Schema, // 表头校验
    Empty,  // 过滤后无数据
    Rows,   // 行级校验
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRejection {
    pub stage: RejectionStage,
    pub errors: Vec<ValidationError>,
}

impl ImportRejection {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
// 读取错误不在此列，由 ImportError 表达
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportResult {
    Accepted(ValidatedPlanilla),
    Rejected(ImportRejection),
}

impl ImportResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ImportResult::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&ValidatedPlanilla> {
        match self {
            ImportResult::Accepted(p) => Some(p),
            ImportResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&ImportRejection> {
        match self {
            ImportResult::Accepted(_) => None,
            ImportResult::Rejected(r) => Some(r),
        }
    }
}
