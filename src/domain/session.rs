// ==========================================
// 缴费申报系统 - 会话上下文
// ==========================================
// 职责: 当前用户、雇主编码（租户）、角色
// 红线: 显式注入，不作为全局单例读取
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Rol - 用户角色
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rol {
    AdminCotizaciones,   // 缴费管理员（可查看所有雇主的申报）
    EmpresaCotizaciones, // 雇主用户
    Otro(String),
}

impl Rol {
    /// 解析角色编码（开发/生产环境编码均识别）
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "ADMIN_COTIZACIONES_DESARROLLO" | "ADMIN_COTIZACIONES_PRODUCCION" => {
                Rol::AdminCotizaciones
            }
            "EMPRESA_COTIZACIONES_DESARROLLO" | "EMPRESA_COTIZACIONES_PRODUCCION" => {
                Rol::EmpresaCotizaciones
            }
            other => Rol::Otro(other.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Rol::AdminCotizaciones)
    }

    pub fn is_empleador(&self) -> bool {
        matches!(self, Rol::EmpresaCotizaciones)
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rol::AdminCotizaciones => write!(f, "ADMIN_COTIZACIONES"),
            Rol::EmpresaCotizaciones => write!(f, "EMPRESA_COTIZACIONES"),
            Rol::Otro(code) => write!(f, "{}", code),
        }
    }
}

// ==========================================
// SessionContext - 会话上下文
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub usuario: String,         // 登录用户名
    pub nombre_completo: String, // 姓名（名 + 父姓 + 母姓）
    pub cod_patronal: String,    // 雇主编码
    pub nombre_empresa: String,  // 雇主名称
    pub rol: Rol,
}

impl SessionContext {
    /// 由人员姓名各部分拼接全名（空白部分跳过）
    pub fn full_name(nombres: &str, primer_apellido: &str, segundo_apellido: &str) -> String {
        [nombres, primer_apellido, segundo_apellido]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_admin(&self) -> bool {
        self.rol.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rol_parse_both_environments() {
        assert!(Rol::parse("ADMIN_COTIZACIONES_PRODUCCION").is_admin());
        assert!(Rol::parse("ADMIN_COTIZACIONES_DESARROLLO").is_admin());
        assert!(Rol::parse("EMPRESA_COTIZACIONES_PRODUCCION").is_empleador());
        assert_eq!(
            Rol::parse("REEMBOLSOS"),
            Rol::Otro("REEMBOLSOS".to_string())
        );
    }

    #[test]
    fn test_full_name_skips_blank_parts() {
        assert_eq!(
            SessionContext::full_name("Ana", "Quispe", " "),
            "Ana Quispe"
        );
    }
}
