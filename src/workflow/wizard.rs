// ==========================================
// 缴费申报系统 - 申报导入向导状态机
// ==========================================
// 流程: 选择期间 → 选择文件 → 解析校验 → 确认提交
// 状态: Idle → FileSelected → Parsing → (ValidationFailed → Idle)
//                                     | (ReadyToSubmit → Submitting → Idle / ReadyToSubmit)
// 约束: 每个向导同时只有一个导入；重新选择文件丢弃之前的校验结果；
//       解析结果携带代次，过期结果直接忽略；提交失败不自动重试
// ==========================================

use crate::domain::import::{ImportResult, ValidatedPlanilla, ValidationError};
use crate::domain::session::SessionContext;
use crate::domain::submission::{FilingPeriod, PlanillaSubmission, SubmissionReceipt};
use crate::i18n;
use crate::importer::{ImportError, PlanillaImport};
use crate::repository::{PlanillaGateway, SubmissionError};
use crate::workflow::alert::{Alert, AlertPresenter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// ==========================================
// WorkflowError - 向导错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("无效的状态转换: state={state} action={action}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("未选择申报期间")]
    MissingPeriod,
}

// ==========================================
// SelectedFile - 已选择的文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),  // 解析时异步读取
    Bytes(Vec<u8>), // 已读入内存
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self {
            name: path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            source: FileSource::Bytes(bytes),
        }
    }
}

/// 解析凭证: 代次不匹配的结果会被忽略
#[derive(Debug, Clone)]
pub struct ParseTicket {
    generation: u64,
    pub file: SelectedFile,
}

impl ParseTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ==========================================
// WizardState - 向导状态
// ==========================================
#[derive(Debug, Clone)]
pub enum WizardState {
    Idle,
    FileSelected {
        file: SelectedFile,
    },
    Parsing {
        file: SelectedFile,
    },
    ValidationFailed {
        file_name: String,
        errors: Vec<ValidationError>,
        read_error: Option<String>,
    },
    ReadyToSubmit {
        planilla: ValidatedPlanilla,
    },
    Submitting {
        planilla: ValidatedPlanilla,
    },
}

impl WizardState {
    pub fn name(&self) -> &'static str {
        match self {
            WizardState::Idle => "Idle",
            WizardState::FileSelected { .. } => "FileSelected",
            WizardState::Parsing { .. } => "Parsing",
            WizardState::ValidationFailed { .. } => "ValidationFailed",
            WizardState::ReadyToSubmit { .. } => "ReadyToSubmit",
            WizardState::Submitting { .. } => "Submitting",
        }
    }
}

/// 解析结果处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    Accepted,
    Rejected,
    ReadFailed,
    Stale, // 已被新的文件选择取代
}

/// 提交结果处理
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    Failed(SubmissionError),
}

// ==========================================
// ImportWizard - 申报导入向导
// ==========================================
pub struct ImportWizard {
    session: SessionContext,
    presenter: Arc<dyn AlertPresenter>,
    locale: String,
    period: Option<FilingPeriod>,
    state: WizardState,
    generation: u64,
}

impl ImportWizard {
    pub fn new(session: SessionContext, presenter: Arc<dyn AlertPresenter>) -> Self {
        Self {
            session,
            presenter,
            locale: i18n::DEFAULT_LOCALE.to_string(),
            period: None,
            state: WizardState::Idle,
            generation: 0,
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn period(&self) -> Option<&FilingPeriod> {
        self.period.as_ref()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// 当前校验错误（仅 ValidationFailed 状态下非空）
    pub fn validation_errors(&self) -> &[ValidationError] {
        match &self.state {
            WizardState::ValidationFailed { errors, .. } => errors,
            _ => &[],
        }
    }

    /// 文件读取错误（仅读取失败的 ValidationFailed 状态下存在）
    pub fn read_error(&self) -> Option<&str> {
        match &self.state {
            WizardState::ValidationFailed { read_error, .. } => read_error.as_deref(),
            _ => None,
        }
    }

    /// 已校验的申报表（ReadyToSubmit / Submitting）
    pub fn planilla(&self) -> Option<&ValidatedPlanilla> {
        match &self.state {
            WizardState::ReadyToSubmit { planilla } | WizardState::Submitting { planilla } => {
                Some(planilla)
            }
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    /// 选择申报期间（提交中不可修改）
    pub fn select_period(&mut self, period: FilingPeriod) -> Result<(), WorkflowError> {
        if matches!(self.state, WizardState::Submitting { .. }) {
            return Err(self.invalid("select_period"));
        }
        self.period = Some(period);
        Ok(())
    }

    /// 选择文件: 丢弃之前的校验结果，进行中的解析结果作废
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), WorkflowError> {
        if matches!(self.state, WizardState::Submitting { .. }) {
            return Err(self.invalid("select_file"));
        }
        self.generation += 1;
        debug!(file_name = %file.name, generation = self.generation, "选择文件");
        self.state = WizardState::FileSelected { file };
        Ok(())
    }

    /// 开始解析（FileSelected → Parsing）
    pub fn start_parsing(&mut self) -> Result<ParseTicket, WorkflowError> {
        let file = match &self.state {
            WizardState::FileSelected { file } => file.clone(),
            _ => return Err(self.invalid("start_parsing")),
        };
        self.state = WizardState::Parsing { file: file.clone() };
        Ok(ParseTicket {
            generation: self.generation,
            file,
        })
    }

    /// 接收解析结果
    ///
    /// 代次不匹配或已不在 Parsing 状态时返回 Stale，不改变状态
    pub fn finish_parsing(
        &mut self,
        ticket: ParseTicket,
        result: Result<ImportResult, ImportError>,
    ) -> ParseOutcome {
        if ticket.generation != self.generation
            || !matches!(self.state, WizardState::Parsing { .. })
        {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "忽略过期的解析结果"
            );
            return ParseOutcome::Stale;
        }

        let file_name = ticket.file.name;
        match result {
            Ok(ImportResult::Accepted(planilla)) => {
                info!(
                    file_name = %file_name,
                    total_trabajadores = planilla.totals.total_trabajadores,
                    "申报表可提交"
                );
                self.state = WizardState::ReadyToSubmit { planilla };
                ParseOutcome::Accepted
            }
            Ok(ImportResult::Rejected(rejection)) => {
                self.presenter
                    .present(&Alert::rejection(&rejection, &self.locale));
                self.state = WizardState::ValidationFailed {
                    file_name,
                    errors: rejection.errors,
                    read_error: None,
                };
                ParseOutcome::Rejected
            }
            Err(err) => {
                warn!(file_name = %file_name, error = %err, "文件读取失败");
                self.presenter.present(&Alert::read_error(&err, &self.locale));
                self.state = WizardState::ValidationFailed {
                    file_name,
                    errors: Vec::new(),
                    read_error: Some(err.to_string()),
                };
                ParseOutcome::ReadFailed
            }
        }
    }

    /// 确认错误后回到 Idle
    pub fn acknowledge_errors(&mut self) -> Result<(), WorkflowError> {
        if !matches!(self.state, WizardState::ValidationFailed { .. }) {
            return Err(self.invalid("acknowledge_errors"));
        }
        self.state = WizardState::Idle;
        Ok(())
    }

    /// 取消本次申报（提交中不可取消）
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        if matches!(self.state, WizardState::Submitting { .. }) {
            return Err(self.invalid("cancel"));
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.period = None;
        self.state = WizardState::Idle;
    }

    /// 开始提交（ReadyToSubmit → Submitting），返回提交载荷
    pub fn begin_submit(&mut self) -> Result<PlanillaSubmission, WorkflowError> {
        if !matches!(self.state, WizardState::ReadyToSubmit { .. }) {
            return Err(self.invalid("begin_submit"));
        }
        let period = match self.period {
            Some(period) => period,
            None => {
                self.presenter
                    .present(&Alert::incomplete_selection(&self.locale));
                return Err(WorkflowError::MissingPeriod);
            }
        };

        let planilla = match std::mem::replace(&mut self.state, WizardState::Idle) {
            WizardState::ReadyToSubmit { planilla } => planilla,
            other => {
                self.state = other;
                return Err(self.invalid("begin_submit"));
            }
        };

        let submission = PlanillaSubmission::build(&self.session, &period, &planilla);
        self.state = WizardState::Submitting { planilla };
        Ok(submission)
    }

    /// 接收提交结果: 成功 → Idle（清空选择）；失败 → ReadyToSubmit（可手动重新提交）
    pub fn complete_submit(
        &mut self,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let planilla = match std::mem::replace(&mut self.state, WizardState::Idle) {
            WizardState::Submitting { planilla } => planilla,
            other => {
                self.state = other;
                return Err(self.invalid("complete_submit"));
            }
        };

        match result {
            Ok(receipt) => {
                info!(id_planilla = receipt.id_planilla, "申报表提交成功");
                self.presenter.present(&Alert::submitted(&self.locale));
                self.reset();
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(err) => {
                warn!(error = %err, "申报表提交失败");
                self.presenter
                    .present(&Alert::submit_failed(&err, &self.locale));
                self.state = WizardState::ReadyToSubmit { planilla };
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    /// 解析当前文件（单次异步读取后校验）
    #[instrument(skip(self, importer))]
    pub async fn run_import(
        &mut self,
        importer: &dyn PlanillaImport,
    ) -> Result<ParseOutcome, WorkflowError> {
        let ticket = self.start_parsing()?;
        let result = match &ticket.file.source {
            FileSource::Path(path) => importer.import_file(path).await,
            FileSource::Bytes(bytes) => importer.import_bytes(bytes, &ticket.file.name),
        };
        Ok(self.finish_parsing(ticket, result))
    }

    /// 提交当前申报表（单次提交，不重试）
    #[instrument(skip(self, gateway))]
    pub async fn submit(
        &mut self,
        gateway: &dyn PlanillaGateway,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let submission = self.begin_submit()?;
        let result = gateway.submit(&submission).await;
        self.complete_submit(result)
    }
}
