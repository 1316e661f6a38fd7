// ==========================================
// 缴费申报系统 - 申报模板
// ==========================================
// 职责: 输出空白申报模板（表头行），供雇主下载填写
// ==========================================

use crate::domain::worker::columns;
use std::io::Write;

/// 写入模板表头（CSV）
pub fn write_template<W: Write>(writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns::TEMPLATE_COLUMNS)?;
    csv_writer.flush()?;
    Ok(())
}
