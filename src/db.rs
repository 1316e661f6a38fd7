// ==========================================
// 缴费申报系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表语句集中在此处（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS planilla (
    id_planilla INTEGER PRIMARY KEY AUTOINCREMENT,
    cod_patronal TEXT NOT NULL,
    mes TEXT NOT NULL,
    gestion INTEGER NOT NULL,
    tipo_planilla TEXT NOT NULL,
    total_importe REAL NOT NULL,
    total_trabajadores INTEGER NOT NULL,
    usuario_creacion TEXT NOT NULL,
    nombre_creacion TEXT NOT NULL,
    created_at TEXT NOT NULL,
    estado INTEGER NOT NULL DEFAULT 0,
    observaciones TEXT,
    fecha_declarada TEXT,
    usuario_procesador TEXT,
    nom_usuario TEXT,
    updated_at TEXT,
    UNIQUE (cod_patronal, mes, gestion, tipo_planilla)
);

CREATE TABLE IF NOT EXISTS planilla_detalle (
    id_detalle INTEGER PRIMARY KEY AUTOINCREMENT,
    id_planilla INTEGER NOT NULL REFERENCES planilla(id_planilla) ON DELETE CASCADE,
    nro TEXT NOT NULL,
    ci TEXT,
    nombres TEXT,
    apellido_paterno TEXT,
    apellido_materno TEXT,
    fecha_ingreso TEXT,
    fecha_retiro TEXT,
    regional TEXT,
    haber_basico REAL NOT NULL DEFAULT 0,
    bono_antiguedad REAL NOT NULL DEFAULT 0,
    monto_horas_extra REAL NOT NULL DEFAULT 0,
    monto_horas_extra_nocturnas REAL NOT NULL DEFAULT 0,
    otros_bonos_pagos REAL NOT NULL DEFAULT 0,
    extra_json TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_planilla_detalle_planilla ON planilla_detalle(id_planilla);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// v1 → v2: planilla 增加状态列
const PLANILLA_ESTADO_COLUMNS: &[(&str, &str)] = &[
    ("estado", "INTEGER NOT NULL DEFAULT 0"),
    ("observaciones", "TEXT"),
    ("fecha_declarada", "TEXT"),
    ("usuario_procesador", "TEXT"),
    ("nom_usuario", "TEXT"),
    ("updated_at", "TEXT"),
];

/// 建表（幂等）并写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    migrate_planilla_estado(conn)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 旧库补齐状态列（已存在的列跳过）
fn migrate_planilla_estado(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('planilla')")?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    drop(stmt);

    for (column, definition) in PLANILLA_ESTADO_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            conn.execute_batch(&format!(
                "ALTER TABLE planilla ADD COLUMN {} {};",
                column, definition
            ))?;
        }
    }
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
