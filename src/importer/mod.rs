// ==========================================
// 缴费申报系统 - 导入层
// ==========================================
// 职责: 申报表文件读取与校验，生成已校验申报表
// 支持: Excel (.xlsx/.xlsm/.xls), OpenDocument (.ods), CSV
// ==========================================

// 模块声明
pub mod aggregator;
pub mod error;
pub mod field_validator;
pub mod file_parser;
pub mod planilla_importer;
pub mod planilla_importer_trait;
pub mod row_filter;
pub mod row_normalizer;
pub mod schema_validator;

// 重导出核心类型
pub use aggregator::Aggregator;
pub use error::{ImportError, ImporterResult};
pub use field_validator::FieldValidator;
pub use file_parser::{CsvParser, ExcelParser, GridReader, ReadOptions, SheetFormat};
pub use planilla_importer::PlanillaImporter;
pub use row_filter::RowFilter;
pub use row_normalizer::RowNormalizer;
pub use schema_validator::SchemaValidator;

// 重导出 Trait 接口
pub use planilla_importer_trait::{FileParser, PlanillaImport, RecordValidator, RowMapper};
