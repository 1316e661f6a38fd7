// ==========================================
// 缴费申报系统 - 申报表提交与查询 Trait
// ==========================================
// 职责: 定义申报提交接口（后端协作方）、归属查询接口与状态读写接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::estado::EstadoPlanilla;
use crate::domain::submission::{PlanillaSubmission, SubmissionReceipt};
use crate::domain::types::TipoPlanilla;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 后端重复申报提示（同一雇主、同月、同年度、同类型）
pub const DUPLICATE_PLANILLA_MESSAGE: &str = "Ya existe una planilla para este mes y gestión.";

/// 重复申报识别标记
const DUPLICATE_MARKER: &str = "Ya existe una planilla";

// ==========================================
// SubmissionError - 提交错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// 同期申报已存在
    #[error("{0}")]
    Duplicate(String),

    /// 后端拒绝（可能附带后端消息）
    #[error("Planilla rechazada: {}", .message.as_deref().unwrap_or("sin detalle"))]
    Rejected { message: Option<String> },

    /// 传输失败（连接/存储不可用）
    #[error("Error de comunicación: {0}")]
    Transport(String),
}

impl SubmissionError {
    /// 按后端消息分类: 含重复标记 → Duplicate，其余 → Rejected
    pub fn from_backend_message(message: Option<String>) -> Self {
        match message {
            Some(msg) if is_duplicate(&msg) => SubmissionError::Duplicate(msg),
            other => SubmissionError::Rejected { message: other },
        }
    }

    /// 后端返回的原始消息
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            SubmissionError::Duplicate(msg) => Some(msg),
            SubmissionError::Rejected { message } => message.as_deref(),
            SubmissionError::Transport(_) => None,
        }
    }
}

/// 后端消息是否表示重复申报
pub fn is_duplicate(message: &str) -> bool {
    message.contains(DUPLICATE_MARKER)
}

// ==========================================
// PlanillaSummary - 申报表摘要（列表查询）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanillaSummary {
    pub id_planilla: i64,
    pub cod_patronal: String,
    pub mes: String,
    pub gestion: i32,
    pub tipo_planilla: TipoPlanilla,
    pub total_importe: f64,
    pub total_trabajadores: usize,
    pub usuario_creacion: String,
    pub created_at: DateTime<Utc>,
    pub estado: EstadoPlanilla,
    pub observaciones: Option<String>,
    pub fecha_declarada: Option<DateTime<Utc>>,
}

// ==========================================
// EstadoRecord / EstadoUpdate - 状态读写载荷
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstadoRecord {
    pub cod_patronal: String,
    pub estado: EstadoPlanilla,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoUpdate {
    pub estado: EstadoPlanilla,
    pub observaciones: Option<String>,
    pub usuario_procesador: String,
    pub nom_usuario: String,
    pub fecha_declarada: Option<DateTime<Utc>>, // 仅申报时写入；None 保留原值
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// PlanillaGateway Trait
// ==========================================
// 用途: 提交已校验申报表（单次提交，不自动重试）
// 实现者: PlanillaRepository（SQLite）；HTTP 后端同样实现此接口
#[async_trait]
pub trait PlanillaGateway: Send + Sync {
    /// 提交申报表
    ///
    /// # 参数
    /// - submission: 申报载荷（期间、合计、劳动者明细）
    ///
    /// # 返回
    /// - Ok(SubmissionReceipt): 后端已受理
    /// - Err(Duplicate): 同期申报已存在
    /// - Err(Rejected/Transport): 其他失败
    async fn submit(
        &self,
        submission: &PlanillaSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

// ==========================================
// PlanillaLookup Trait
// ==========================================
// 用途: 访问控制所需的归属查询
// 实现者: PlanillaRepository
#[async_trait]
pub trait PlanillaLookup: Send + Sync {
    /// 查询申报表所属雇主编码
    ///
    /// # 返回
    /// - Ok(Some(cod_patronal)): 申报表存在
    /// - Ok(None): 申报表不存在
    async fn find_cod_patronal(&self, id_planilla: i64) -> RepositoryResult<Option<String>>;
}

// ==========================================
// PlanillaEstadoStore Trait
// ==========================================
// 用途: 申报/审核流程的状态读写（规则在 workflow::revision）
// 实现者: PlanillaRepository
#[async_trait]
pub trait PlanillaEstadoStore: Send + Sync {
    /// 查询申报表当前状态
    ///
    /// # 返回
    /// - Ok(None): 申报表不存在
    async fn find_estado(&self, id_planilla: i64) -> RepositoryResult<Option<EstadoRecord>>;

    /// 写入新状态
    ///
    /// # 返回
    /// - Err(NotFound): 申报表不存在
    async fn update_estado(&self, id_planilla: i64, update: &EstadoUpdate)
        -> RepositoryResult<()>;
}
