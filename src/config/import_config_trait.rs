// ==========================================
// 缴费申报系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::ImportConfig;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取金额小数位
    ///
    /// # 默认值
    /// - 2
    async fn get_decimal_precision(&self) -> ConfigResult<u32>;

    /// 获取文本日期候选格式（按顺序尝试）
    ///
    /// # 默认值
    /// - ["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"]
    async fn get_date_formats(&self) -> ConfigResult<Vec<String>>;

    /// 获取 ISO 日期单元格的显示格式
    ///
    /// # 默认值
    /// - "%d/%m/%Y"
    async fn get_date_display_format(&self) -> ConfigResult<String>;

    /// 获取校验消息语言
    ///
    /// # 默认值
    /// - "es"
    async fn get_locale(&self) -> ConfigResult<String>;

    /// 汇总为完整的导入配置
    async fn load_import_config(&self) -> ConfigResult<ImportConfig> {
        Ok(ImportConfig {
            decimal_precision: self.get_decimal_precision().await?,
            date_formats: self.get_date_formats().await?,
            date_display_format: self.get_date_display_format().await?,
            locale: self.get_locale().await?,
        })
    }
}
