// ==========================================
// 缴费申报系统 - 导入配置
// ==========================================
// 职责: 导入管道参数（日期格式、金额精度、消息语言）
// 红线: 必需列/金额列为固定模板契约，不可配置
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认日期候选格式（按顺序尝试，首个成功者生效）
pub const DEFAULT_DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

/// 默认日期显示格式
pub const DEFAULT_DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// 默认金额小数位
pub const DEFAULT_DECIMAL_PRECISION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 金额保留小数位
    pub decimal_precision: u32,
    /// 文本日期候选格式（chrono 格式串）
    pub date_formats: Vec<String>,
    /// 读取器渲染 ISO 日期单元格时使用的显示格式
    pub date_display_format: String,
    /// 校验消息语言
    pub locale: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            decimal_precision: DEFAULT_DECIMAL_PRECISION,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            date_display_format: DEFAULT_DATE_DISPLAY_FORMAT.to_string(),
            locale: crate::i18n::DEFAULT_LOCALE.to_string(),
        }
    }
}

impl ImportConfig {
    /// 指定语言的默认配置
    pub fn with_locale(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Self::default()
        }
    }
}
