// ==========================================
// 缴费申报系统 - 字段校验器实现
// ==========================================
// 职责: 行级必填/日期/金额校验
// 规则: 批量校验，收集全部错误，不中途停止
// ==========================================

use crate::domain::import::{ValidationError, ValidationErrorKind};
use crate::domain::types::{format_number, DateField};
use crate::domain::worker::{columns, WorkerRecord};
use crate::i18n;
use crate::importer::planilla_importer_trait::RecordValidator;

pub struct FieldValidator {
    locale: String,
}

impl FieldValidator {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
        }
    }

    /// 校验所有记录，按行顺序输出错误
    pub fn validate(&self, records: &[WorkerRecord]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for record in records {
            self.validate_required_fields(record, &mut errors);
            self.validate_dates(record, &mut errors);
            self.validate_amounts(record, &mut errors);
        }
        errors
    }

    /// 必填字段: 文本为空或日期缺失
    ///
    /// 日期存在但格式无效时不重复报告缺失
    fn validate_required_fields(&self, record: &WorkerRecord, errors: &mut Vec<ValidationError>) {
        for field in columns::REQUIRED_FIELDS {
            let missing = if columns::DATE_COLUMNS.contains(&field) {
                record.date_field(field).is_none()
            } else {
                record.text(field).map(|s| s.trim().is_empty()).unwrap_or(true)
            };

            if missing {
                errors.push(self.error(
                    record,
                    field,
                    ValidationErrorKind::RequiredField,
                    "import.required_field",
                    None,
                ));
            }
        }
    }

    fn validate_dates(&self, record: &WorkerRecord, errors: &mut Vec<ValidationError>) {
        for field in columns::DATE_COLUMNS {
            if let Some(DateField::Invalid(raw)) = record.date_field(field) {
                errors.push(self.error(
                    record,
                    field,
                    ValidationErrorKind::InvalidDate,
                    "import.invalid_date",
                    Some(raw),
                ));
            }
        }
    }

    /// 金额: 存在且为非有限值或负数
    fn validate_amounts(&self, record: &WorkerRecord, errors: &mut Vec<ValidationError>) {
        for field in columns::NUMERIC_COLUMNS {
            if let Some(value) = record.amount(field) {
                if !value.is_finite() || value < 0.0 {
                    errors.push(self.error(
                        record,
                        field,
                        ValidationErrorKind::InvalidNumber,
                        "import.invalid_number",
                        Some(&format_number(value)),
                    ));
                }
            }
        }
    }

    fn error(
        &self,
        record: &WorkerRecord,
        field: &str,
        kind: ValidationErrorKind,
        key: &str,
        value: Option<&str>,
    ) -> ValidationError {
        let row = record.row_number.to_string();
        let message = i18n::t_in(
            &self.locale,
            key,
            &[("row", &row), ("field", field), ("value", value.unwrap_or(""))],
        );

        ValidationError {
            row: record.row_number,
            field: Some(field.to_string()),
            kind,
            message,
        }
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new(i18n::DEFAULT_LOCALE)
    }
}

impl RecordValidator for FieldValidator {
    fn validate_records(&self, records: &[WorkerRecord]) -> Vec<ValidationError> {
        self.validate(records)
    }
}
