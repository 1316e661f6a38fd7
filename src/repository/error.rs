// ==========================================
// 缴费申报系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束分类: 按 SQLite 扩展错误码区分唯一约束/外键约束
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束错误 =====
    // 同一雇主同期同类型的申报已存在
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // 明细行引用了不存在的申报表
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据格式错误 =====
    // 明细 extra_json 列读写失败
    #[error("明细附加列序列化失败: {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let detail = msg.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(detail)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        RepositoryError::ForeignKeyViolation(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "planilla".to_string(),
                id: "?".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn planilla_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE planilla (id INTEGER PRIMARY KEY, mes TEXT, gestion INTEGER, UNIQUE (mes, gestion));
             CREATE TABLE detalle (id_planilla INTEGER NOT NULL REFERENCES planilla(id));
             INSERT INTO planilla (id, mes, gestion) VALUES (1, '03', 2025);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_duplicate_period_is_unique_violation() {
        let conn = planilla_table();

        let err: RepositoryError = conn
            .execute("INSERT INTO planilla (mes, gestion) VALUES ('03', 2025)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_orphan_detail_is_foreign_key_violation() {
        let conn = planilla_table();

        let err: RepositoryError = conn
            .execute("INSERT INTO detalle (id_planilla) VALUES (99)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }
}
