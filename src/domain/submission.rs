// ==========================================
// 缴费申报系统 - 申报提交领域模型
// ==========================================
// 职责: 申报期间、提交载荷、提交回执
// ==========================================

use crate::domain::import::{ImportTotals, ValidatedPlanilla};
use crate::domain::session::SessionContext;
use crate::domain::types::TipoPlanilla;
use crate::domain::worker::WorkerRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// FilingPeriod - 申报期间（月份 + 年度 + 类型）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingPeriod {
    pub mes: u32,     // 1..=12
    pub gestion: i32, // 年度
    pub tipo_planilla: TipoPlanilla,
}

impl FilingPeriod {
    /// 构造期间，月份越界返回 None
    pub fn new(mes: u32, gestion: i32, tipo_planilla: TipoPlanilla) -> Option<Self> {
        if (1..=12).contains(&mes) {
            Some(Self {
                mes,
                gestion,
                tipo_planilla,
            })
        } else {
            None
        }
    }

    /// 两位月份字符串（"01".."12"）
    pub fn mes_str(&self) -> String {
        format!("{:02}", self.mes)
    }
}

// ==========================================
// PlanillaSubmission - 提交载荷（JSON）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanillaSubmission {
    pub cod_patronal: String,
    pub mes: String,
    pub gestion: i32,
    pub tipo_planilla: TipoPlanilla,
    pub usuario_creacion: String,
    pub nombre_creacion: String,
    pub total_importe: f64,
    pub total_trabajadores: usize,
    pub trabajadores: Vec<WorkerRecord>,
}

impl PlanillaSubmission {
    /// 由会话、期间与校验结果组装载荷
    pub fn build(
        session: &SessionContext,
        period: &FilingPeriod,
        planilla: &ValidatedPlanilla,
    ) -> Self {
        let ImportTotals {
            total_importe,
            total_trabajadores,
            ..
        } = planilla.totals;

        Self {
            cod_patronal: session.cod_patronal.clone(),
            mes: period.mes_str(),
            gestion: period.gestion,
            tipo_planilla: period.tipo_planilla,
            usuario_creacion: session.usuario.clone(),
            nombre_creacion: session.nombre_completo.clone(),
            total_importe,
            total_trabajadores,
            trabajadores: planilla.records.clone(),
        }
    }
}

// ==========================================
// SubmissionReceipt - 提交回执
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id_planilla: i64,
    pub mensaje: String,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filing_period_rejects_invalid_month() {
        assert!(FilingPeriod::new(0, 2025, TipoPlanilla::Mensual).is_none());
        assert!(FilingPeriod::new(13, 2025, TipoPlanilla::Mensual).is_none());

        let period = FilingPeriod::new(3, 2025, TipoPlanilla::Reintegro).unwrap();
        assert_eq!(period.mes_str(), "03");
    }
}
