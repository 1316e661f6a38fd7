// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、样例文件路径、会话与提示记录器
// ==========================================

#![allow(dead_code)]

use planilla_aportes::domain::{Rol, SessionContext};
use planilla_aportes::workflow::{Alert, AlertPresenter};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库（schema 由仓储/配置管理器幂等初始化）
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = planilla_aportes::db::open_sqlite_connection(&db_path)?;
    planilla_aportes::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 样例申报文件路径
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/planillas")
        .join(name)
}

/// 雇主用户会话
pub fn empleador_session(cod_patronal: &str) -> SessionContext {
    SessionContext {
        usuario: "empresa01".to_string(),
        nombre_completo: SessionContext::full_name("Ana", "Rojas", ""),
        cod_patronal: cod_patronal.to_string(),
        nombre_empresa: "Empresa de Prueba S.R.L.".to_string(),
        rol: Rol::EmpresaCotizaciones,
    }
}

/// 管理员会话
pub fn admin_session() -> SessionContext {
    SessionContext {
        usuario: "admin".to_string(),
        nombre_completo: "Administrador".to_string(),
        cod_patronal: String::new(),
        nombre_empresa: String::new(),
        rol: Rol::AdminCotizaciones,
    }
}

/// 记录所有提示，供断言
#[derive(Default)]
pub struct RecordingPresenter {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingPresenter {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Alert> {
        self.alerts.lock().unwrap().last().cloned()
    }
}

impl AlertPresenter for RecordingPresenter {
    fn present(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}
