// ==========================================
// 缴费申报系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入逻辑
// ==========================================

pub mod estado;
pub mod import;
pub mod session;
pub mod submission;
pub mod types;
pub mod worker;

// 重导出核心类型
pub use estado::EstadoPlanilla;
pub use import::{
    ImportRejection, ImportResult, ImportTotals, RejectionStage, ValidatedPlanilla,
    ValidationError, ValidationErrorKind,
};
pub use session::{Rol, SessionContext};
pub use submission::{FilingPeriod, PlanillaSubmission, SubmissionReceipt};
pub use types::{CellValue, DateField, Header, RawGrid, TipoPlanilla};
pub use worker::{columns, WorkerRecord};
