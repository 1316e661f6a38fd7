// ==========================================
// 缴费申报系统 - 申报流程层
// ==========================================
// 职责: 导入向导状态机 + 申报/审核流程 + 用户提示
// ==========================================

pub mod alert;
pub mod revision;
pub mod wizard;

pub use alert::{Alert, AlertPresenter, AlertSeverity, TracingAlertPresenter};
pub use revision::{PlanillaRevision, RevisionError};
pub use wizard::{
    FileSource, ImportWizard, ParseOutcome, ParseTicket, SelectedFile, SubmitOutcome,
    WizardState, WorkflowError,
};
