// ==========================================
// 缴费申报系统 - 表头校验器
// ==========================================
// 职责: 检查表头是否包含全部必需列
// 规则: 列名精确匹配（区分大小写、含重音符）
// ==========================================

use crate::domain::import::{ValidationError, ValidationErrorKind};
use crate::domain::types::Header;
use crate::domain::worker::columns;
use crate::i18n;

pub struct SchemaValidator {
    locale: String,
}

impl SchemaValidator {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
        }
    }

    /// 一次性报告所有缺失列，每列一条错误（行号 1 = 表头行）
    pub fn validate(&self, header: &Header) -> Vec<ValidationError> {
        columns::REQUIRED_COLUMNS
            .iter()
            .filter(|column| !header.contains(column))
            .map(|column| ValidationError {
                row: 1,
                field: Some(column.to_string()),
                kind: ValidationErrorKind::MissingColumn,
                message: i18n::t_in(&self.locale, "import.missing_column", &[("column", column)]),
            })
            .collect()
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(i18n::DEFAULT_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Header {
        Header::new(cols.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_full_header_passes() {
        let mut cols = vec![columns::NRO];
        cols.extend(columns::REQUIRED_COLUMNS.iter());
        assert!(SchemaValidator::default().validate(&header(&cols)).is_empty());
    }

    #[test]
    fn test_reports_every_missing_column() {
        let errors = SchemaValidator::default().validate(&header(&[
            columns::NRO,
            columns::NUMERO_DOCUMENTO,
            columns::NOMBRES,
            columns::APELLIDO_PATERNO,
            columns::APELLIDO_MATERNO,
        ]));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Falta la columna requerida: Fecha de ingreso");
        assert_eq!(errors[1].message, "Falta la columna requerida: regional");
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::MissingColumn && e.row == 1));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let errors = SchemaValidator::default().validate(&header(&[
            columns::NUMERO_DOCUMENTO,
            columns::NOMBRES,
            columns::APELLIDO_PATERNO,
            columns::APELLIDO_MATERNO,
            columns::FECHA_INGRESO,
            "Regional",
        ]));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some(columns::REGIONAL));
    }

    #[test]
    fn test_empty_header_reports_all_six() {
        let errors = SchemaValidator::default().validate(&Header::default());
        assert_eq!(errors.len(), 6);
    }
}
