// ==========================================
// 缴费申报系统 - 申报表导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到已校验的申报表
// 流程: 读取 → 表头校验 → 规范化 → 过滤 → 空表检查 → 字段校验 → 汇总
// 说明: 无跨调用状态，每次导入都从新读取的文件开始
// ==========================================

use crate::config::ImportConfig;
use crate::domain::import::{
    ImportRejection, ImportResult, RejectionStage, ValidatedPlanilla, ValidationError,
    ValidationErrorKind,
};
use crate::domain::types::{Header, RawGrid};
use crate::domain::worker::WorkerRecord;
use crate::i18n;
use crate::importer::aggregator::Aggregator;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_validator::FieldValidator;
use crate::importer::file_parser::{GridReader, ReadOptions};
use crate::importer::planilla_importer_trait::{PlanillaImport, RecordValidator, RowMapper};
use crate::importer::row_filter::RowFilter;
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::schema_validator::SchemaValidator;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PlanillaImporter - 申报表导入器
// ==========================================
pub struct PlanillaImporter {
    config: ImportConfig,

    // 导入组件
    schema_validator: SchemaValidator,
    row_mapper: Box<dyn RowMapper>,
    record_validator: Box<dyn RecordValidator>,
    aggregator: Aggregator,
}

impl PlanillaImporter {
    /// 使用默认组件创建导入器
    pub fn new(config: ImportConfig) -> Self {
        let row_mapper = Box::new(RowNormalizer::new(&config));
        let record_validator = Box::new(FieldValidator::new(&config.locale));
        Self::with_components(config, row_mapper, record_validator)
    }

    /// 注入自定义的行映射器/字段校验器
    ///
    /// # 参数
    /// - config: 导入配置
    /// - row_mapper: 行映射器
    /// - record_validator: 字段校验器
    pub fn with_components(
        config: ImportConfig,
        row_mapper: Box<dyn RowMapper>,
        record_validator: Box<dyn RecordValidator>,
    ) -> Self {
        Self {
            schema_validator: SchemaValidator::new(&config.locale),
            aggregator: Aggregator::new(config.decimal_precision),
            config,
            row_mapper,
            record_validator,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions::with_date_display_format(&self.config.date_display_format)
    }

    /// 对已读取的网格执行校验管道
    #[instrument(skip(self, grid), fields(import_id))]
    pub fn import_grid(&self, grid: RawGrid, file_name: &str) -> ImportResult {
        let import_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("import_id", import_id.as_str());
        info!(file_name = %file_name, total_rows = grid.len(), "开始校验申报表");

        let mut rows = grid.into_iter();

        // === 步骤 1: 表头校验 ===
        let header = rows
            .next()
            .map(|row| Header::from_row(&row))
            .unwrap_or_default();
        let schema_errors = self.schema_validator.validate(&header);
        if !schema_errors.is_empty() {
            warn!(missing = schema_errors.len(), "表头缺少必需列");
            return Self::reject(RejectionStage::Schema, schema_errors);
        }

        // === 步骤 2: 行规范化 ===
        // 表头为第 1 行，首个数据行为第 2 行
        let records: Vec<WorkerRecord> = rows
            .enumerate()
            .map(|(idx, row)| self.row_mapper.map_row(&row, &header, idx + 2))
            .collect();
        debug!(rows = records.len(), "行规范化完成");

        // === 步骤 3: 行过滤 ===
        let records = RowFilter::retain(records);
        if records.is_empty() {
            warn!("没有带序号的数据行");
            let error = ValidationError {
                row: 0,
                field: None,
                kind: ValidationErrorKind::NoDataRows,
                message: i18n::t_in(&self.config.locale, "import.no_data_rows", &[]),
            };
            return Self::reject(RejectionStage::Empty, vec![error]);
        }

        // === 步骤 4: 字段校验 ===
        let row_errors = self.record_validator.validate_records(&records);
        if !row_errors.is_empty() {
            warn!(errors = row_errors.len(), "字段校验失败");
            return Self::reject(RejectionStage::Rows, row_errors);
        }

        // === 步骤 5: 汇总 ===
        let totals = self.aggregator.totals(&records);
        info!(
            total_trabajadores = totals.total_trabajadores,
            total_importe = totals.total_importe,
            "申报表校验通过"
        );

        ImportResult::Accepted(ValidatedPlanilla {
            import_id,
            file_name: file_name.to_string(),
            records,
            totals,
        })
    }

    fn reject(stage: RejectionStage, errors: Vec<ValidationError>) -> ImportResult {
        ImportResult::Rejected(ImportRejection { stage, errors })
    }
}

impl Default for PlanillaImporter {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

#[async_trait]
impl PlanillaImport for PlanillaImporter {
    fn import_bytes(&self, bytes: &[u8], file_name: &str) -> ImporterResult<ImportResult> {
        let grid = GridReader.read_bytes(bytes, file_name, &self.read_options())?;
        Ok(self.import_grid(grid, file_name))
    }

    async fn import_file(&self, file_path: &Path) -> ImporterResult<ImportResult> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ImportError::FileNotFound(file_path.display().to_string()))?
            .to_string();

        let bytes = tokio::fs::read(file_path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ImportError::FileNotFound(file_path.display().to_string())
            }
            _ => ImportError::from(e),
        })?;
        debug!(file_name = %file_name, size = bytes.len(), "文件读取完成");

        self.import_bytes(&bytes, &file_name)
    }
}
