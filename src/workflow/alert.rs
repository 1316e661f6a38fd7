// ==========================================
// 缴费申报系统 - 提示消息
// ==========================================
// 职责: 导入/提交/审核结果 → 用户提示（标题、正文、级别）
// 展示由 AlertPresenter 实现者负责
// ==========================================

use crate::domain::estado::EstadoPlanilla;
use crate::domain::import::{ImportRejection, RejectionStage};
use crate::i18n;
use crate::importer::ImportError;
use crate::repository::SubmissionError;
use crate::workflow::revision::RevisionError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// 成功提示自动关闭时间
const SUCCESS_TIMER_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub body: String,
    pub timer_ms: Option<u64>, // None = 需要用户确认
}

impl Alert {
    fn new(severity: AlertSeverity, title: String, body: String) -> Self {
        Self {
            severity,
            title,
            body,
            timer_ms: None,
        }
    }

    /// 文件不可读
    pub fn read_error(err: &ImportError, locale: &str) -> Self {
        Self::new(
            AlertSeverity::Error,
            i18n::t_in(locale, "alert.read_error_title", &[]),
            err.to_string(),
        )
    }

    /// 校验失败: 空表为警告，其余为错误；正文逐行列出全部错误
    pub fn rejection(rejection: &ImportRejection, locale: &str) -> Self {
        let body = rejection.messages().join("\n");
        match rejection.stage {
            RejectionStage::Empty => Self::new(
                AlertSeverity::Warning,
                i18n::t_in(locale, "alert.empty_title", &[]),
                body,
            ),
            RejectionStage::Schema | RejectionStage::Rows => Self::new(
                AlertSeverity::Error,
                i18n::t_in(locale, "alert.validation_title", &[]),
                body,
            ),
        }
    }

    /// 提交前未选择期间
    pub fn incomplete_selection(locale: &str) -> Self {
        Self::new(
            AlertSeverity::Warning,
            i18n::t_in(locale, "alert.incomplete_title", &[]),
            i18n::t_in(locale, "alert.incomplete_body", &[]),
        )
    }

    pub fn submitted(locale: &str) -> Self {
        Self {
            timer_ms: Some(SUCCESS_TIMER_MS),
            ..Self::new(
                AlertSeverity::Success,
                i18n::t_in(locale, "alert.submitted_title", &[]),
                i18n::t_in(locale, "alert.submitted_body", &[]),
            )
        }
    }

    /// 提交失败: 重复申报单独提示，其余显示后端消息或通用提示
    pub fn submit_failed(err: &SubmissionError, locale: &str) -> Self {
        match err {
            SubmissionError::Duplicate(_) => Self::new(
                AlertSeverity::Error,
                i18n::t_in(locale, "alert.duplicate_title", &[]),
                i18n::t_in(locale, "submit.duplicate", &[]),
            ),
            other => Self::new(
                AlertSeverity::Error,
                i18n::t_in(locale, "alert.error_title", &[]),
                other
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| i18n::t_in(locale, "submit.generic_error", &[])),
            ),
        }
    }

    /// 状态变更成功
    pub fn estado_updated(estado: EstadoPlanilla, locale: &str) -> Self {
        let (title, body) = match estado {
            EstadoPlanilla::Pendiente => ("alert.declared_title", "alert.declared_body"),
            EstadoPlanilla::Aprobada => ("alert.approved_title", "alert.estado_body"),
            EstadoPlanilla::Observada => ("alert.observed_title", "alert.estado_body"),
            EstadoPlanilla::Borrador => ("common.success", "alert.estado_body"),
        };
        Self {
            timer_ms: Some(SUCCESS_TIMER_MS),
            ..Self::new(
                AlertSeverity::Success,
                i18n::t_in(locale, title, &[]),
                i18n::t_in(locale, body, &[]),
            )
        }
    }

    /// 状态变更失败: 缺少审核意见为警告，其余为错误
    pub fn revision_failed(err: &RevisionError, locale: &str) -> Self {
        let error = |body: String| {
            Self::new(
                AlertSeverity::Error,
                i18n::t_in(locale, "alert.error_title", &[]),
                body,
            )
        };
        match err {
            RevisionError::ObservacionesRequeridas => Self::new(
                AlertSeverity::Warning,
                i18n::t_in(locale, "alert.observaciones_title", &[]),
                i18n::t_in(locale, "revision.observaciones_required", &[]),
            ),
            RevisionError::NotFound(id) => error(i18n::t_in(
                locale,
                "revision.not_found",
                &[("id", &id.to_string())],
            )),
            RevisionError::Forbidden { .. } => {
                error(i18n::t_in(locale, "revision.forbidden", &[]))
            }
            RevisionError::InvalidTransition { from, to } => error(i18n::t_in(
                locale,
                "revision.invalid_transition",
                &[("from", from.as_str()), ("to", to.as_str())],
            )),
            RevisionError::Repository(_) => {
                error(i18n::t_in(locale, "revision.update_failed", &[]))
            }
        }
    }
}

// ==========================================
// AlertPresenter Trait
// ==========================================
// 实现者: TracingAlertPresenter（CLI）；界面层提供弹窗实现
pub trait AlertPresenter: Send + Sync {
    fn present(&self, alert: &Alert);
}

/// 以日志形式输出提示
pub struct TracingAlertPresenter;

impl AlertPresenter for TracingAlertPresenter {
    fn present(&self, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Success => info!(title = %alert.title, body = %alert.body, "提示"),
            AlertSeverity::Warning => warn!(title = %alert.title, body = %alert.body, "提示"),
            AlertSeverity::Error => error!(title = %alert.title, body = %alert.body, "提示"),
        }
    }
}
