// ==========================================
// 缴费申报系统 - 行过滤器
// ==========================================
// 职责: 仅保留带有序号（"Nro."）的行
// 说明: 过滤掉模板说明行、空行、合计行
// ==========================================

use crate::domain::worker::WorkerRecord;

pub struct RowFilter;

impl RowFilter {
    /// 序号存在且去空白后非空
    pub fn has_sequence(record: &WorkerRecord) -> bool {
        record
            .nro
            .as_deref()
            .map(|nro| !nro.trim().is_empty())
            .unwrap_or(false)
    }

    /// 保留有序号的行（保持原顺序，幂等）
    pub fn retain(mut records: Vec<WorkerRecord>) -> Vec<WorkerRecord> {
        records.retain(Self::has_sequence);
        records
    }
}
