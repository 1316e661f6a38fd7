// ==========================================
// 缴费申报系统 - 数据仓储层
// ==========================================
// 职责: 申报表持久化、归属查询与状态读写
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

pub mod error;
pub mod planilla_repo;
pub mod planilla_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use planilla_repo::{
    is_duplicate, EstadoRecord, EstadoUpdate, PlanillaEstadoStore, PlanillaGateway,
    PlanillaLookup, PlanillaSummary, SubmissionError, DUPLICATE_PLANILLA_MESSAGE,
};
pub use planilla_repo_impl::PlanillaRepository;
