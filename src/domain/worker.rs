// ==========================================
// 缴费申报系统 - 劳动者记录领域模型
// ==========================================
// 职责: 申报模板列定义 + WorkerRecord 中间结构体
// 生命周期: 仅在单次导入会话内
// ==========================================

use crate::domain::types::{CellValue, DateField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 模板列名（精确匹配，区分大小写）
// ==========================================
pub mod columns {
    pub const NRO: &str = "Nro.";
    pub const NUMERO_DOCUMENTO: &str = "Número documento de identidad";
    pub const NOMBRES: &str = "Nombres";
    pub const APELLIDO_PATERNO: &str = "Apellido Paterno";
    pub const APELLIDO_MATERNO: &str = "Apellido Materno";
    pub const FECHA_INGRESO: &str = "Fecha de ingreso";
    pub const FECHA_RETIRO: &str = "Fecha de retiro";
    pub const REGIONAL: &str = "regional";

    pub const HABER_BASICO: &str = "Haber Básico";
    pub const BONO_ANTIGUEDAD: &str = "Bono de antigüedad";
    pub const MONTO_HORAS_EXTRA: &str = "Monto horas extra";
    pub const MONTO_HORAS_EXTRA_NOCTURNAS: &str = "Monto horas extra nocturnas";
    pub const OTROS_BONOS_PAGOS: &str = "Otros bonos y pagos";

    /// 表头必需列
    pub const REQUIRED_COLUMNS: [&str; 6] = [
        NUMERO_DOCUMENTO,
        NOMBRES,
        APELLIDO_PATERNO,
        APELLIDO_MATERNO,
        FECHA_INGRESO,
        REGIONAL,
    ];

    /// 行级必填字段
    pub const REQUIRED_FIELDS: [&str; 4] = [NUMERO_DOCUMENTO, NOMBRES, FECHA_INGRESO, REGIONAL];

    pub const DATE_COLUMNS: [&str; 2] = [FECHA_INGRESO, FECHA_RETIRO];

    /// 金额列（参与合计）
    pub const NUMERIC_COLUMNS: [&str; 5] = [
        HABER_BASICO,
        BONO_ANTIGUEDAD,
        MONTO_HORAS_EXTRA,
        MONTO_HORAS_EXTRA_NOCTURNAS,
        OTROS_BONOS_PAGOS,
    ];

    /// 模板表头顺序（模板下载用）
    pub const TEMPLATE_COLUMNS: [&str; 15] = [
        NRO,
        NUMERO_DOCUMENTO,
        "Complemento",
        NOMBRES,
        APELLIDO_PATERNO,
        APELLIDO_MATERNO,
        "Cargo",
        FECHA_INGRESO,
        FECHA_RETIRO,
        HABER_BASICO,
        BONO_ANTIGUEDAD,
        MONTO_HORAS_EXTRA,
        MONTO_HORAS_EXTRA_NOCTURNAS,
        OTROS_BONOS_PAGOS,
        REGIONAL,
    ];
}

// ==========================================
// WorkerRecord - 劳动者行记录
// ==========================================
// 序列化键即模板列名；未校验的列放入 extra
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    #[serde(rename = "Nro.")]
    pub nro: Option<String>,
    #[serde(rename = "Número documento de identidad")]
    pub numero_documento: Option<String>,
    #[serde(rename = "Nombres")]
    pub nombres: Option<String>,
    #[serde(rename = "Apellido Paterno")]
    pub apellido_paterno: Option<String>,
    #[serde(rename = "Apellido Materno")]
    pub apellido_materno: Option<String>,
    #[serde(rename = "Fecha de ingreso")]
    pub fecha_ingreso: Option<DateField>,
    #[serde(rename = "Fecha de retiro")]
    pub fecha_retiro: Option<DateField>,
    #[serde(rename = "regional")]
    pub regional: Option<String>,

    // ===== 金额列 =====
    #[serde(rename = "Haber Básico")]
    pub haber_basico: Option<f64>,
    #[serde(rename = "Bono de antigüedad")]
    pub bono_antiguedad: Option<f64>,
    #[serde(rename = "Monto horas extra")]
    pub monto_horas_extra: Option<f64>,
    #[serde(rename = "Monto horas extra nocturnas")]
    pub monto_horas_extra_nocturnas: Option<f64>,
    #[serde(rename = "Otros bonos y pagos")]
    pub otros_bonos_pagos: Option<f64>,

    // ===== 透传列 =====
    #[serde(flatten)]
    pub extra: BTreeMap<String, CellValue>,

    // 原始表格行号（表头为第 1 行）
    #[serde(skip)]
    pub row_number: usize,
}

impl WorkerRecord {
    /// 按列名读取金额字段
    pub fn amount(&self, column: &str) -> Option<f64> {
        match column {
            columns::HABER_BASICO => self.haber_basico,
            columns::BONO_ANTIGUEDAD => self.bono_antiguedad,
            columns::MONTO_HORAS_EXTRA => self.monto_horas_extra,
            columns::MONTO_HORAS_EXTRA_NOCTURNAS => self.monto_horas_extra_nocturnas,
            columns::OTROS_BONOS_PAGOS => self.otros_bonos_pagos,
            _ => None,
        }
    }

    /// 按列名写入金额字段，非金额列返回 false
    pub fn set_amount(&mut self, column: &str, value: f64) -> bool {
        let slot = match column {
            columns::HABER_BASICO => &mut self.haber_basico,
            columns::BONO_ANTIGUEDAD => &mut self.bono_antiguedad,
            columns::MONTO_HORAS_EXTRA => &mut self.monto_horas_extra,
            columns::MONTO_HORAS_EXTRA_NOCTURNAS => &mut self.monto_horas_extra_nocturnas,
            columns::OTROS_BONOS_PAGOS => &mut self.otros_bonos_pagos,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// 按列名读取文本字段
    pub fn text(&self, column: &str) -> Option<&str> {
        let value = match column {
            columns::NRO => &self.nro,
            columns::NUMERO_DOCUMENTO => &self.numero_documento,
            columns::NOMBRES => &self.nombres,
            columns::APELLIDO_PATERNO => &self.apellido_paterno,
            columns::APELLIDO_MATERNO => &self.apellido_materno,
            columns::REGIONAL => &self.regional,
            _ => return None,
        };
        value.as_deref()
    }

    /// 按列名读取日期字段
    pub fn date_field(&self, column: &str) -> Option<&DateField> {
        match column {
            columns::FECHA_INGRESO => self.fecha_ingreso.as_ref(),
            columns::FECHA_RETIRO => self.fecha_retiro.as_ref(),
            _ => None,
        }
    }

    /// 行合计: 五个金额列之和（缺失按 0）
    pub fn row_importe(&self) -> f64 {
        columns::NUMERIC_COLUMNS
            .iter()
            .map(|c| self.amount(c).unwrap_or(0.0))
            .sum()
    }
}
