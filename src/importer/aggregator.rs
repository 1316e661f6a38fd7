// ==========================================
// 缴费申报系统 - 汇总器
// ==========================================
// 职责: 计算申报合计（金额总计、劳动者人数、各列小计）
// 说明: 纯函数，输入必须是已通过校验的记录
// ==========================================

use crate::config::import_config::DEFAULT_DECIMAL_PRECISION;
use crate::domain::import::ImportTotals;
use crate::domain::worker::{columns, WorkerRecord};
use crate::importer::row_filter::RowFilter;
use std::collections::BTreeMap;

pub struct Aggregator {
    decimal_precision: u32,
}

impl Aggregator {
    pub fn new(decimal_precision: u32) -> Self {
        Self { decimal_precision }
    }

    /// 汇总: 缺失金额按 0 计
    pub fn totals(&self, records: &[WorkerRecord]) -> ImportTotals {
        let mut por_columna: BTreeMap<String, f64> = columns::NUMERIC_COLUMNS
            .iter()
            .map(|c| (c.to_string(), 0.0))
            .collect();

        for record in records {
            for column in columns::NUMERIC_COLUMNS {
                if let Some(subtotal) = por_columna.get_mut(column) {
                    *subtotal += record.amount(column).unwrap_or(0.0);
                }
            }
        }

        // 浮点累加误差按精度消除
        for subtotal in por_columna.values_mut() {
            *subtotal = self.round(*subtotal);
        }
        let total_importe = self.round(records.iter().map(WorkerRecord::row_importe).sum());
        let total_trabajadores = records.iter().filter(|r| RowFilter::has_sequence(r)).count();

        ImportTotals {
            total_importe,
            total_trabajadores,
            por_columna,
        }
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimal_precision as i32);
        (value * factor).round() / factor
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DECIMAL_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nro: &str, haber: f64, bono: Option<f64>) -> WorkerRecord {
        WorkerRecord {
            nro: Some(nro.to_string()),
            haber_basico: Some(haber),
            bono_antiguedad: bono,
            ..WorkerRecord::default()
        }
    }

    #[test]
    fn test_totals_sum_all_amount_columns() {
        let totals = Aggregator::default().totals(&[
            record("1", 3000.0, Some(150.0)),
            record("2", 2500.5, None),
        ]);

        assert_eq!(totals.total_importe, 5650.5);
        assert_eq!(totals.total_trabajadores, 2);
        assert_eq!(totals.por_columna[columns::HABER_BASICO], 5500.5);
        assert_eq!(totals.por_columna[columns::BONO_ANTIGUEDAD], 150.0);
        assert_eq!(totals.por_columna[columns::OTROS_BONOS_PAGOS], 0.0);
    }

    #[test]
    fn test_totals_without_float_noise() {
        let totals = Aggregator::default().totals(&[
            record("1", 0.1, None),
            record("2", 0.2, None),
        ]);
        assert_eq!(totals.total_importe, 0.3);
    }

    #[test]
    fn test_zero_amount_row_keeps_total() {
        let base = vec![record("1", 3000.0, Some(150.0)), record("2", 2500.5, None)];
        let mut with_zero = base.clone();
        with_zero.push(WorkerRecord {
            nro: Some("3".to_string()),
            haber_basico: Some(0.0),
            bono_antiguedad: Some(0.0),
            monto_horas_extra: Some(0.0),
            monto_horas_extra_nocturnas: Some(0.0),
            otros_bonos_pagos: Some(0.0),
            ..WorkerRecord::default()
        });

        let before = Aggregator::default().totals(&base);
        let after = Aggregator::default().totals(&with_zero);

        assert_eq!(after.total_importe, before.total_importe);
        assert_eq!(after.por_columna, before.por_columna);
        assert_eq!(after.total_trabajadores, before.total_trabajadores + 1);
    }

    #[test]
    fn test_empty_input() {
        let totals = Aggregator::default().totals(&[]);
        assert_eq!(totals.total_importe, 0.0);
        assert_eq!(totals.total_trabajadores, 0);
        assert_eq!(totals.por_columna.len(), 5);
    }
}
