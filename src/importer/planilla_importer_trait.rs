// ==========================================
// 缴费申报系统 - 申报表导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 读取 → 表头校验 → 行规范化 → 行过滤 → 字段校验 → 汇总
// ==========================================

use crate::domain::import::{ImportResult, ValidationError};
use crate::domain::types::{CellValue, Header, RawGrid};
use crate::domain::worker::WorkerRecord;
use crate::importer::error::ImporterResult;
use crate::importer::file_parser::ReadOptions;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// PlanillaImport Trait
// ==========================================
// 用途: 申报表导入主接口
// 实现者: PlanillaImporter
#[async_trait]
pub trait PlanillaImport: Send + Sync {
    /// 从内存字节导入（文件已读入）
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - file_name: 文件名（用于识别格式）
    ///
    /// # 返回
    /// - Ok(ImportResult::Accepted): 校验通过，含记录与合计
    /// - Ok(ImportResult::Rejected): 表头/行级校验失败，含全部错误
    /// - Err: 文件不可读或已损坏
    fn import_bytes(&self, bytes: &[u8], file_name: &str) -> ImporterResult<ImportResult>;

    /// 从文件路径导入（单次异步读取后解析）
    async fn import_file(&self, file_path: &Path) -> ImporterResult<ImportResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容为单元格网格（第一个工作表）
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - options: 读取参数（日期显示格式、CSV 分隔符）
    ///
    /// # 返回
    /// - Ok(RawGrid): 行 × 列原始单元格
    /// - Err: 格式错误
    fn parse_to_grid(&self, bytes: &[u8], options: &ReadOptions) -> ImporterResult<RawGrid>;
}

// ==========================================
// RowMapper Trait
// ==========================================
// 用途: 行映射接口（阶段 2）
// 实现者: RowNormalizer
pub trait RowMapper: Send + Sync {
    /// 将一行原始单元格按表头映射为 WorkerRecord
    ///
    /// # 参数
    /// - row: 数据行（可能短于表头，缺失单元格视为空）
    /// - header: 表头
    /// - row_number: 表格行号（表头为第 1 行）
    fn map_row(&self, row: &[CellValue], header: &Header, row_number: usize) -> WorkerRecord;
}

// ==========================================
// RecordValidator Trait
// ==========================================
// 用途: 行级字段校验接口（阶段 4）
// 实现者: FieldValidator
pub trait RecordValidator: Send + Sync {
    /// 批量校验所有记录，收集全部错误（不中途停止）
    fn validate_records(&self, records: &[WorkerRecord]) -> Vec<ValidationError>;
}
