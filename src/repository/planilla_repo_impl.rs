// ==========================================
// 缴费申报系统 - 申报表 Repository 实现
// ==========================================
// 职责: 申报表及明细的持久化、状态读写（使用 rusqlite）
// 约束: 同一雇主 + 月份 + 年度 + 类型 唯一；明细整体写入或整体回滚
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::estado::EstadoPlanilla;
use crate::domain::submission::{PlanillaSubmission, SubmissionReceipt};
use crate::domain::types::{CellValue, DateField, TipoPlanilla};
use crate::domain::worker::WorkerRecord;
use crate::i18n;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::planilla_repo::{
    EstadoRecord, EstadoUpdate, PlanillaEstadoStore, PlanillaGateway, PlanillaLookup,
    PlanillaSummary, SubmissionError, DUPLICATE_PLANILLA_MESSAGE,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

/// 明细日期存储格式
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// PlanillaRepository
// ==========================================
pub struct PlanillaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanillaRepository {
    /// 创建新的 Repository 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入申报表及全部明细（事务化）
    ///
    /// # 返回
    /// - Ok(i64): 新申报表 ID
    /// - Err(UniqueConstraintViolation): 同期申报已存在
    pub fn insert_planilla(&self, submission: &PlanillaSubmission) -> RepositoryResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO planilla (
                cod_patronal, mes, gestion, tipo_planilla, total_importe,
                total_trabajadores, usuario_creacion, nombre_creacion, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                submission.cod_patronal,
                submission.mes,
                submission.gestion,
                submission.tipo_planilla.as_str(),
                submission.total_importe,
                submission.total_trabajadores as i64,
                submission.usuario_creacion,
                submission.nombre_creacion,
                Utc::now(),
            ],
        )?;
        let id_planilla = tx.last_insert_rowid();

        Self::batch_insert_detalle_tx(&tx, id_planilla, &submission.trabajadores)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(id_planilla)
    }

    /// 在事务中批量插入明细
    fn batch_insert_detalle_tx(
        tx: &Transaction,
        id_planilla: i64,
        trabajadores: &[WorkerRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO planilla_detalle (
                id_planilla, nro, ci, nombres, apellido_paterno, apellido_materno,
                fecha_ingreso, fecha_retiro, regional, haber_basico, bono_antiguedad,
                monto_horas_extra, monto_horas_extra_nocturnas, otros_bonos_pagos, extra_json
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )?;

        let mut count = 0;
        for worker in trabajadores {
            stmt.execute(params![
                id_planilla,
                worker.nro.as_deref().unwrap_or_default(),
                worker.numero_documento,
                worker.nombres,
                worker.apellido_paterno,
                worker.apellido_materno,
                worker.fecha_ingreso.as_ref().map(date_to_sql),
                worker.fecha_retiro.as_ref().map(date_to_sql),
                worker.regional,
                worker.haber_basico.unwrap_or(0.0),
                worker.bono_antiguedad.unwrap_or(0.0),
                worker.monto_horas_extra.unwrap_or(0.0),
                worker.monto_horas_extra_nocturnas.unwrap_or(0.0),
                worker.otros_bonos_pagos.unwrap_or(0.0),
                serde_json::to_string(&worker.extra)?,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 按雇主列出申报表（可按月份/年度过滤），最新期间在前
    pub fn list_by_cod_patronal(
        &self,
        cod_patronal: &str,
        mes: Option<&str>,
        gestion: Option<i32>,
    ) -> RepositoryResult<Vec<PlanillaSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id_planilla, cod_patronal, mes, gestion, tipo_planilla, total_importe,
                   total_trabajadores, usuario_creacion, created_at, estado, observaciones,
                   fecha_declarada
            FROM planilla
            WHERE cod_patronal = ?1
              AND (?2 IS NULL OR mes = ?2)
              AND (?3 IS NULL OR gestion = ?3)
            ORDER BY gestion DESC, mes DESC, id_planilla DESC
            "#,
        )?;

        let rows = stmt.query_map(params![cod_patronal, mes, gestion], map_summary)?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    /// 查询申报表所属雇主编码
    pub fn find_cod_patronal_sync(&self, id_planilla: i64) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        let cod = conn
            .query_row(
                "SELECT cod_patronal FROM planilla WHERE id_planilla = ?1",
                params![id_planilla],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(cod)
    }

    /// 查询申报表状态
    pub fn find_estado_sync(&self, id_planilla: i64) -> RepositoryResult<Option<EstadoRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT cod_patronal, estado, observaciones FROM planilla WHERE id_planilla = ?1",
                params![id_planilla],
                |row| {
                    Ok(EstadoRecord {
                        cod_patronal: row.get(0)?,
                        estado: estado_from_sql(row, 1)?,
                        observaciones: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// 写入申报表状态（fecha_declarada 为 None 时保留原值）
    pub fn update_estado_sync(
        &self,
        id_planilla: i64,
        update: &EstadoUpdate,
    ) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            r#"
            UPDATE planilla
            SET estado = ?2,
                observaciones = ?3,
                usuario_procesador = ?4,
                nom_usuario = ?5,
                fecha_declarada = COALESCE(?6, fecha_declarada),
                updated_at = ?7
            WHERE id_planilla = ?1
            "#,
            params![
                id_planilla,
                update.estado.code(),
                update.observaciones,
                update.usuario_procesador,
                update.nom_usuario,
                update.fecha_declarada,
                update.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "planilla".to_string(),
                id: id_planilla.to_string(),
            });
        }
        Ok(())
    }

    /// 统计申报表明细行数
    pub fn count_detalle(&self, id_planilla: i64) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM planilla_detalle WHERE id_planilla = ?1",
            params![id_planilla],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 读取申报表明细（按插入顺序）
    pub fn list_detalle(&self, id_planilla: i64) -> RepositoryResult<Vec<WorkerRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT nro, ci, nombres, apellido_paterno, apellido_materno, fecha_ingreso,
                   fecha_retiro, regional, haber_basico, bono_antiguedad, monto_horas_extra,
                   monto_horas_extra_nocturnas, otros_bonos_pagos, extra_json
            FROM planilla_detalle
            WHERE id_planilla = ?1
            ORDER BY id_detalle
            "#,
        )?;

        let rows = stmt.query_map(params![id_planilla], |row| {
            Ok((map_detalle(row)?, row.get::<_, String>(13)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, extra_json) = row?;
            record.extra = serde_json::from_str::<BTreeMap<String, CellValue>>(&extra_json)?;
            records.push(record);
        }
        Ok(records)
    }
}

// ==========================================
// PlanillaGateway Trait 实现
// ==========================================
#[async_trait]
impl PlanillaGateway for PlanillaRepository {
    #[instrument(skip(self, submission), fields(cod_patronal = %submission.cod_patronal))]
    async fn submit(
        &self,
        submission: &PlanillaSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if submission.trabajadores.is_empty() {
            return Err(SubmissionError::Rejected {
                message: Some("La planilla no contiene trabajadores.".to_string()),
            });
        }

        match self.insert_planilla(submission) {
            Ok(id_planilla) => {
                info!(
                    id_planilla = id_planilla,
                    total_trabajadores = submission.total_trabajadores,
                    "申报表已入库"
                );
                let count = submission.total_trabajadores.to_string();
                Ok(SubmissionReceipt {
                    id_planilla,
                    mensaje: i18n::t_in(
                        i18n::DEFAULT_LOCALE,
                        "submit.accepted",
                        &[("count", &count)],
                    ),
                    received_at: Utc::now(),
                })
            }
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                warn!(
                    mes = %submission.mes,
                    gestion = submission.gestion,
                    detail = %msg,
                    "同期申报已存在"
                );
                Err(SubmissionError::Duplicate(
                    DUPLICATE_PLANILLA_MESSAGE.to_string(),
                ))
            }
            Err(RepositoryError::LockError(msg)) => Err(SubmissionError::Transport(msg)),
            Err(e) => Err(SubmissionError::Rejected {
                message: Some(e.to_string()),
            }),
        }
    }
}

// ==========================================
// PlanillaLookup Trait 实现
// ==========================================
#[async_trait]
impl PlanillaLookup for PlanillaRepository {
    async fn find_cod_patronal(&self, id_planilla: i64) -> RepositoryResult<Option<String>> {
        self.find_cod_patronal_sync(id_planilla)
    }
}

// ==========================================
// PlanillaEstadoStore Trait 实现
// ==========================================
#[async_trait]
impl PlanillaEstadoStore for PlanillaRepository {
    async fn find_estado(&self, id_planilla: i64) -> RepositoryResult<Option<EstadoRecord>> {
        self.find_estado_sync(id_planilla)
    }

    #[instrument(skip(self, update), fields(estado = %update.estado))]
    async fn update_estado(
        &self,
        id_planilla: i64,
        update: &EstadoUpdate,
    ) -> RepositoryResult<()> {
        self.update_estado_sync(id_planilla, update)?;
        info!(
            id_planilla = id_planilla,
            usuario = %update.usuario_procesador,
            "申报表状态已更新"
        );
        Ok(())
    }
}

// ==========================================
// 行映射
// ==========================================

fn estado_from_sql(row: &Row, idx: usize) -> rusqlite::Result<EstadoPlanilla> {
    let code: i64 = row.get(idx)?;
    EstadoPlanilla::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Integer,
            format!("estado desconocido: {}", code).into(),
        )
    })
}

fn map_summary(row: &Row) -> rusqlite::Result<PlanillaSummary> {
    let tipo_raw: String = row.get(4)?;
    let tipo_planilla = TipoPlanilla::parse(&tipo_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("tipo_planilla desconocido: {}", tipo_raw).into(),
        )
    })?;

    Ok(PlanillaSummary {
        id_planilla: row.get(0)?,
        cod_patronal: row.get(1)?,
        mes: row.get(2)?,
        gestion: row.get(3)?,
        tipo_planilla,
        total_importe: row.get(5)?,
        total_trabajadores: row.get::<_, i64>(6)? as usize,
        usuario_creacion: row.get(7)?,
        created_at: row.get(8)?,
        estado: estado_from_sql(row, 9)?,
        observaciones: row.get(10)?,
        fecha_declarada: row.get(11)?,
    })
}

fn map_detalle(row: &Row) -> rusqlite::Result<WorkerRecord> {
    let nro: String = row.get(0)?;
    Ok(WorkerRecord {
        nro: Some(nro),
        numero_documento: row.get(1)?,
        nombres: row.get(2)?,
        apellido_paterno: row.get(3)?,
        apellido_materno: row.get(4)?,
        fecha_ingreso: row.get::<_, Option<String>>(5)?.map(|s| date_from_sql(&s)),
        fecha_retiro: row.get::<_, Option<String>>(6)?.map(|s| date_from_sql(&s)),
        regional: row.get(7)?,
        haber_basico: row.get(8)?,
        bono_antiguedad: row.get(9)?,
        monto_horas_extra: row.get(10)?,
        monto_horas_extra_nocturnas: row.get(11)?,
        otros_bonos_pagos: row.get(12)?,
        ..WorkerRecord::default()
    })
}

fn date_to_sql(field: &DateField) -> String {
    match field {
        DateField::Value(date) => date.format(STORED_DATE_FORMAT).to_string(),
        DateField::Invalid(raw) => raw.clone(),
    }
}

fn date_from_sql(raw: &str) -> DateField {
    NaiveDate::parse_from_str(raw, STORED_DATE_FORMAT)
        .map(DateField::Value)
        .unwrap_or_else(|_| DateField::Invalid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TipoPlanilla;

    fn repo() -> PlanillaRepository {
        let conn = Connection::open_in_memory().unwrap();
        PlanillaRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn worker(nro: &str) -> WorkerRecord {
        WorkerRecord {
            nro: Some(nro.to_string()),
            numero_documento: Some("4567890".to_string()),
            nombres: Some("Ana".to_string()),
            fecha_ingreso: Some(DateField::Value(
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            )),
            regional: Some("La Paz".to_string()),
            haber_basico: Some(3000.0),
            extra: BTreeMap::from([("Cargo".to_string(), CellValue::Text("Chofer".into()))]),
            ..WorkerRecord::default()
        }
    }

    fn submission(mes: &str, trabajadores: Vec<WorkerRecord>) -> PlanillaSubmission {
        PlanillaSubmission {
            cod_patronal: "01-730-00001".to_string(),
            mes: mes.to_string(),
            gestion: 2025,
            tipo_planilla: TipoPlanilla::Mensual,
            usuario_creacion: "ana.quispe".to_string(),
            nombre_creacion: "Ana Quispe".to_string(),
            total_importe: 3000.0 * trabajadores.len() as f64,
            total_trabajadores: trabajadores.len(),
            trabajadores,
        }
    }

    #[tokio::test]
    async fn test_submit_persists_header_and_details() {
        let repo = repo();
        let receipt = repo
            .submit(&submission("03", vec![worker("1"), worker("2")]))
            .await
            .unwrap();

        assert_eq!(repo.count_detalle(receipt.id_planilla).unwrap(), 2);
        assert_eq!(receipt.mensaje, "Planilla registrada con 2 trabajadores.");

        let detalle = repo.list_detalle(receipt.id_planilla).unwrap();
        assert_eq!(detalle[0].nro.as_deref(), Some("1"));
        assert_eq!(detalle[0].fecha_ingreso, worker("1").fecha_ingreso);
        assert_eq!(detalle[0].haber_basico, Some(3000.0));
        // 缺失金额落库为 0
        assert_eq!(detalle[0].bono_antiguedad, Some(0.0));
        assert_eq!(detalle[0].extra, worker("1").extra);
    }

    #[tokio::test]
    async fn test_duplicate_period_is_rejected() {
        let repo = repo();
        repo.submit(&submission("03", vec![worker("1")])).await.unwrap();

        let err = repo
            .submit(&submission("03", vec![worker("1")]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SubmissionError::Duplicate(DUPLICATE_PLANILLA_MESSAGE.to_string())
        );
        assert_eq!(repo.list_by_cod_patronal("01-730-00001", None, None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let err = repo().submit(&submission("03", vec![])).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { message: Some(_) }));
    }

    #[tokio::test]
    async fn test_list_filters_and_lookup() {
        let repo = repo();
        let marzo = repo.submit(&submission("03", vec![worker("1")])).await.unwrap();
        repo.submit(&submission("04", vec![worker("1")])).await.unwrap();

        let all = repo.list_by_cod_patronal("01-730-00001", None, Some(2025)).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].mes, "04");

        let only_march = repo
            .list_by_cod_patronal("01-730-00001", Some("03"), None)
            .unwrap();
        assert_eq!(only_march.len(), 1);
        assert_eq!(only_march[0].tipo_planilla, TipoPlanilla::Mensual);

        assert_eq!(
            repo.find_cod_patronal(marzo.id_planilla).await.unwrap(),
            Some("01-730-00001".to_string())
        );
        assert_eq!(repo.find_cod_patronal(9999).await.unwrap(), None);
    }

    fn update(estado: EstadoPlanilla, observaciones: Option<&str>) -> EstadoUpdate {
        EstadoUpdate {
            estado,
            observaciones: observaciones.map(str::to_string),
            usuario_procesador: "revisor01".to_string(),
            nom_usuario: "Revisor Uno".to_string(),
            fecha_declarada: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_new_planilla_starts_as_borrador() {
        let repo = repo();
        let receipt = repo.submit(&submission("03", vec![worker("1")])).await.unwrap();

        let record = repo.find_estado(receipt.id_planilla).await.unwrap().unwrap();
        assert_eq!(record.estado, EstadoPlanilla::Borrador);
        assert_eq!(record.cod_patronal, "01-730-00001");
        assert_eq!(record.observaciones, None);

        let summary = &repo.list_by_cod_patronal("01-730-00001", None, None).unwrap()[0];
        assert_eq!(summary.estado, EstadoPlanilla::Borrador);
        assert_eq!(summary.fecha_declarada, None);
    }

    #[tokio::test]
    async fn test_update_estado_keeps_fecha_declarada() {
        let repo = repo();
        let id = repo
            .submit(&submission("03", vec![worker("1")]))
            .await
            .unwrap()
            .id_planilla;

        let declarada = Utc::now();
        let mut pendiente = update(EstadoPlanilla::Pendiente, None);
        pendiente.fecha_declarada = Some(declarada);
        repo.update_estado(id, &pendiente).await.unwrap();
        repo.update_estado(id, &update(EstadoPlanilla::Observada, Some("Falta CI")))
            .await
            .unwrap();

        let summary = &repo.list_by_cod_patronal("01-730-00001", None, None).unwrap()[0];
        assert_eq!(summary.estado, EstadoPlanilla::Observada);
        assert_eq!(summary.observaciones.as_deref(), Some("Falta CI"));
        assert_eq!(summary.fecha_declarada, Some(declarada));
    }

    #[tokio::test]
    async fn test_update_estado_of_missing_planilla() {
        let err = repo()
            .update_estado(9999, &update(EstadoPlanilla::Pendiente, None))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(repo().find_estado(9999).await.unwrap(), None);
    }
}
