// ==========================================
// 缴费申报系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::{
    DEFAULT_DATE_DISPLAY_FORMAT, DEFAULT_DATE_FORMATS, DEFAULT_DECIMAL_PRECISION,
};
use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 金额小数位上限
const MAX_DECIMAL_PRECISION: u32 = 6;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_decimal_precision(&self) -> ConfigResult<u32> {
        let value = self.get_config_or_default(
            config_keys::DECIMAL_PRECISION,
            &DEFAULT_DECIMAL_PRECISION.to_string(),
        )?;
        match value.trim().parse::<u32>() {
            Ok(p) if p <= MAX_DECIMAL_PRECISION => Ok(p),
            _ => {
                tracing::warn!(
                    config_key = config_keys::DECIMAL_PRECISION,
                    raw_value = %value,
                    "金额小数位配置无效，使用默认值"
                );
                Ok(DEFAULT_DECIMAL_PRECISION)
            }
        }
    }

    async fn get_date_formats(&self) -> ConfigResult<Vec<String>> {
        let default = DEFAULT_DATE_FORMATS.join(",");
        let value = self.get_config_or_default(config_keys::DATE_FORMATS, &default)?;
        let formats: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if formats.is_empty() {
            Ok(DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect())
        } else {
            Ok(formats)
        }
    }

    async fn get_date_display_format(&self) -> ConfigResult<String> {
        let value = self
            .get_config_or_default(config_keys::DATE_DISPLAY_FORMAT, DEFAULT_DATE_DISPLAY_FORMAT)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_DATE_DISPLAY_FORMAT.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn get_locale(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::LOCALE, crate::i18n::DEFAULT_LOCALE)?;
        match value.trim() {
            "es" | "en" => Ok(value.trim().to_string()),
            _ => Ok(crate::i18n::DEFAULT_LOCALE.to_string()),
        }
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const DECIMAL_PRECISION: &str = "import.decimal_precision";
    pub const DATE_FORMATS: &str = "import.date_formats"; // 逗号分隔
    pub const DATE_DISPLAY_FORMAT: &str = "import.date_display_format";
    pub const LOCALE: &str = "import.locale";
}
