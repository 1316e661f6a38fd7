// ==========================================
// 缴费申报系统 - 核心库
// ==========================================
// 职责: 雇主缴费申报表（planilla de aportes）的导入、校验与提交
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 表格读取与校验管道
pub mod importer;

// 流程层 - 导入向导与提示
pub mod workflow;

// 数据仓储层 - 申报表持久化
pub mod repository;

// 访问控制
pub mod access;

// 申报模板
pub mod template;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use access::{AccessDecision, PlanillaAccessPolicy};
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};
pub use domain::{
    CellValue, DateField, EstadoPlanilla, FilingPeriod, Header, ImportRejection, ImportResult,
    ImportTotals, PlanillaSubmission, RawGrid, RejectionStage, Rol, SessionContext,
    SubmissionReceipt, TipoPlanilla, ValidatedPlanilla, ValidationError, ValidationErrorKind,
    WorkerRecord,
};
pub use importer::{GridReader, ImportError, PlanillaImport, PlanillaImporter};
pub use repository::{
    PlanillaEstadoStore, PlanillaGateway, PlanillaLookup, PlanillaRepository, SubmissionError,
};
pub use workflow::{
    Alert, AlertPresenter, ImportWizard, PlanillaRevision, RevisionError, SelectedFile, WizardState,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Planillas de Aportes";

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PLANILLA_APORTES_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PLANILLA_APORTES_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./planilla_aportes.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("planilla-aportes-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("planilla-aportes");

        // 确保目录存在；创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("planilla_aportes.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_db_path_has_file_name() {
        assert!(get_default_db_path().ends_with(".db") || std::env::var(DB_PATH_ENV).is_ok());
    }
}
