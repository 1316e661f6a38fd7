// ==========================================
// 缴费申报系统 - 申报表访问控制
// ==========================================
// 职责: 判断当前会话能否查看某张申报表
// 规则: 管理员可查看全部；雇主只能查看本雇主编码下的申报表
// ==========================================

use crate::domain::session::SessionContext;
use crate::repository::{PlanillaLookup, RepositoryResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 访问判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessDecision {
    Allowed,
    Denied,
    NotFound,
    InvalidId, // ID 不是正整数
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

pub struct PlanillaAccessPolicy;

impl PlanillaAccessPolicy {
    /// 检查会话对申报表的访问权限
    ///
    /// # 参数
    /// - session: 当前会话
    /// - raw_id: 外部传入的申报表 ID（未解析）
    /// - lookup: 归属查询
    ///
    /// # 返回
    /// - Ok(AccessDecision): 判定结果
    /// - Err: 查询失败
    pub async fn check(
        session: &SessionContext,
        raw_id: &str,
        lookup: &dyn PlanillaLookup,
    ) -> RepositoryResult<AccessDecision> {
        if session.is_admin() {
            return Ok(AccessDecision::Allowed);
        }

        let id_planilla = match raw_id.trim().parse::<i64>() {
            Ok(id) if id > 0 => id,
            _ => {
                debug!(raw_id = %raw_id, "申报表 ID 无效");
                return Ok(AccessDecision::InvalidId);
            }
        };

        let decision = match lookup.find_cod_patronal(id_planilla).await? {
            None => AccessDecision::NotFound,
            Some(cod) if cod == session.cod_patronal => AccessDecision::Allowed,
            Some(cod) => {
                warn!(
                    id_planilla = id_planilla,
                    owner = %cod,
                    requester = %session.cod_patronal,
                    "拒绝访问其他雇主的申报表"
                );
                AccessDecision::Denied
            }
        };

        Ok(decision)
    }
}
