// ==========================================
// 缴费申报系统 - 申报与审核流程
// ==========================================
// 雇主: Borrador | Observada → Pendiente（申报）
// 管理员: Pendiente → Aprobada | Observada（审核，退回必须填写意见）
// 状态读写经由 PlanillaEstadoStore，规则只在此处
// ==========================================

use crate::domain::estado::EstadoPlanilla;
use crate::domain::session::SessionContext;
use crate::i18n;
use crate::repository::{EstadoUpdate, PlanillaEstadoStore, RepositoryError};
use crate::workflow::alert::{Alert, AlertPresenter};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

// ==========================================
// RevisionError - 申报/审核错误
// ==========================================
#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("申报表不存在: id={0}")]
    NotFound(i64),

    #[error("无权变更申报表状态: usuario={usuario}")]
    Forbidden { usuario: String },

    #[error("无效的状态转换: {from} → {to}")]
    InvalidTransition {
        from: EstadoPlanilla,
        to: EstadoPlanilla,
    },

    #[error("退回申报表必须填写审核意见")]
    ObservacionesRequeridas,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// PlanillaRevision - 申报/审核服务
// ==========================================
pub struct PlanillaRevision {
    session: SessionContext,
    presenter: Arc<dyn AlertPresenter>,
    locale: String,
}

impl PlanillaRevision {
    pub fn new(session: SessionContext, presenter: Arc<dyn AlertPresenter>) -> Self {
        Self {
            session,
            presenter,
            locale: i18n::DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// 雇主申报本雇主的申报表（草稿或被退回的申报表 → 待审核）
    ///
    /// # 返回
    /// - Ok(Pendiente): 申报成功
    /// - Err(Forbidden): 非雇主用户或非本雇主申报表
    /// - Err(InvalidTransition): 已待审核或已通过
    #[instrument(skip(self, store), fields(usuario = %self.session.usuario))]
    pub async fn declarar(
        &self,
        id_planilla: i64,
        store: &dyn PlanillaEstadoStore,
    ) -> Result<EstadoPlanilla, RevisionError> {
        let result = self.try_declarar(id_planilla, store).await;
        self.report(id_planilla, &result);
        result
    }

    async fn try_declarar(
        &self,
        id_planilla: i64,
        store: &dyn PlanillaEstadoStore,
    ) -> Result<EstadoPlanilla, RevisionError> {
        let record = store
            .find_estado(id_planilla)
            .await?
            .ok_or(RevisionError::NotFound(id_planilla))?;

        if !self.session.rol.is_empleador() || record.cod_patronal != self.session.cod_patronal {
            return Err(self.forbidden());
        }

        let target = EstadoPlanilla::Pendiente;
        if !record.estado.is_declarable() {
            return Err(RevisionError::InvalidTransition {
                from: record.estado,
                to: target,
            });
        }

        let now = Utc::now();
        store
            .update_estado(
                id_planilla,
                &EstadoUpdate {
                    estado: target,
                    observaciones: None,
                    usuario_procesador: self.session.usuario.clone(),
                    nom_usuario: self.session.nombre_completo.clone(),
                    fecha_declarada: Some(now),
                    updated_at: now,
                },
            )
            .await?;
        Ok(target)
    }

    /// 管理员审核待审核申报表
    ///
    /// # 参数
    /// - estado: Aprobada 或 Observada
    /// - observaciones: 审核意见（Observada 时必填，去空白后不可为空）
    #[instrument(skip(self, observaciones, store), fields(usuario = %self.session.usuario))]
    pub async fn actualizar_estado(
        &self,
        id_planilla: i64,
        estado: EstadoPlanilla,
        observaciones: Option<&str>,
        store: &dyn PlanillaEstadoStore,
    ) -> Result<EstadoPlanilla, RevisionError> {
        let result = self
            .try_actualizar_estado(id_planilla, estado, observaciones, store)
            .await;
        self.report(id_planilla, &result);
        result
    }

    async fn try_actualizar_estado(
        &self,
        id_planilla: i64,
        estado: EstadoPlanilla,
        observaciones: Option<&str>,
        store: &dyn PlanillaEstadoStore,
    ) -> Result<EstadoPlanilla, RevisionError> {
        if !self.session.is_admin() {
            return Err(self.forbidden());
        }

        let observaciones = observaciones
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if estado == EstadoPlanilla::Observada && observaciones.is_none() {
            return Err(RevisionError::ObservacionesRequeridas);
        }

        let record = store
            .find_estado(id_planilla)
            .await?
            .ok_or(RevisionError::NotFound(id_planilla))?;

        if record.estado != EstadoPlanilla::Pendiente || !estado.is_review_outcome() {
            return Err(RevisionError::InvalidTransition {
                from: record.estado,
                to: estado,
            });
        }

        store
            .update_estado(
                id_planilla,
                &EstadoUpdate {
                    estado,
                    observaciones,
                    usuario_procesador: self.session.usuario.clone(),
                    nom_usuario: self.session.nombre_completo.clone(),
                    fecha_declarada: None,
                    updated_at: Utc::now(),
                },
            )
            .await?;
        Ok(estado)
    }

    fn forbidden(&self) -> RevisionError {
        RevisionError::Forbidden {
            usuario: self.session.usuario.clone(),
        }
    }

    fn report(&self, id_planilla: i64, result: &Result<EstadoPlanilla, RevisionError>) {
        match result {
            Ok(estado) => {
                info!(id_planilla = id_planilla, estado = %estado, "申报表状态变更成功");
                self.presenter
                    .present(&Alert::estado_updated(*estado, &self.locale));
            }
            Err(err) => {
                warn!(id_planilla = id_planilla, error = %err, "申报表状态变更失败");
                self.presenter
                    .present(&Alert::revision_failed(err, &self.locale));
            }
        }
    }
}
