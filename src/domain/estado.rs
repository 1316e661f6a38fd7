// ==========================================
// 缴费申报系统 - 申报表状态
// ==========================================
// 生命周期: Borrador → Pendiente → Aprobada | Observada
// Observada 可由雇主修正后再次申报（→ Pendiente）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// EstadoPlanilla - 申报表状态（存储为整数编码）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPlanilla {
    #[default]
    Borrador,  // 0: 已入库，尚未申报
    Pendiente, // 1: 已申报，待审核
    Aprobada,  // 2: 审核通过
    Observada, // 3: 审核退回（附意见）
}

impl EstadoPlanilla {
    pub fn code(&self) -> i64 {
        match self {
            EstadoPlanilla::Borrador => 0,
            EstadoPlanilla::Pendiente => 1,
            EstadoPlanilla::Aprobada => 2,
            EstadoPlanilla::Observada => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EstadoPlanilla::Borrador),
            1 => Some(EstadoPlanilla::Pendiente),
            2 => Some(EstadoPlanilla::Aprobada),
            3 => Some(EstadoPlanilla::Observada),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoPlanilla::Borrador => "BORRADOR",
            EstadoPlanilla::Pendiente => "PENDIENTE",
            EstadoPlanilla::Aprobada => "APROBADA",
            EstadoPlanilla::Observada => "OBSERVADA",
        }
    }

    /// 从字符串解析（名称、审核动作或数字编码，忽略大小写）
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        if let Ok(code) = normalized.parse::<i64>() {
            return Self::from_code(code);
        }
        match normalized.as_str() {
            "borrador" => Some(EstadoPlanilla::Borrador),
            "pendiente" => Some(EstadoPlanilla::Pendiente),
            "aprobada" | "aprobar" => Some(EstadoPlanilla::Aprobada),
            "observada" | "observar" => Some(EstadoPlanilla::Observada),
            _ => None,
        }
    }

    /// 雇主可申报的状态
    pub fn is_declarable(&self) -> bool {
        matches!(self, EstadoPlanilla::Borrador | EstadoPlanilla::Observada)
    }

    /// 审核可选的目标状态
    pub fn is_review_outcome(&self) -> bool {
        matches!(self, EstadoPlanilla::Aprobada | EstadoPlanilla::Observada)
    }
}

impl fmt::Display for EstadoPlanilla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for estado in [
            EstadoPlanilla::Borrador,
            EstadoPlanilla::Pendiente,
            EstadoPlanilla::Aprobada,
            EstadoPlanilla::Observada,
        ] {
            assert_eq!(EstadoPlanilla::from_code(estado.code()), Some(estado));
        }
        assert_eq!(EstadoPlanilla::from_code(7), None);
    }

    #[test]
    fn test_parse_accepts_review_actions() {
        assert_eq!(EstadoPlanilla::parse("Aprobar"), Some(EstadoPlanilla::Aprobada));
        assert_eq!(EstadoPlanilla::parse(" observar "), Some(EstadoPlanilla::Observada));
        assert_eq!(EstadoPlanilla::parse("1"), Some(EstadoPlanilla::Pendiente));
        assert_eq!(EstadoPlanilla::parse("rechazada"), None);
    }

    #[test]
    fn test_declarable_and_review_states() {
        assert!(EstadoPlanilla::Borrador.is_declarable());
        assert!(EstadoPlanilla::Observada.is_declarable());
        assert!(!EstadoPlanilla::Pendiente.is_declarable());
        assert!(!EstadoPlanilla::Aprobada.is_declarable());

        assert!(EstadoPlanilla::Aprobada.is_review_outcome());
        assert!(!EstadoPlanilla::Pendiente.is_review_outcome());
    }
}
