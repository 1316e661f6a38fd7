// ==========================================
// 申报流程端到端测试
// ==========================================
// 测试目标: 向导（选择期间/文件 → 解析 → 提交）+ SQLite 仓储 + 访问控制 + 申报/审核
// ==========================================

mod test_helpers;

use planilla_aportes::access::{AccessDecision, PlanillaAccessPolicy};
use planilla_aportes::domain::{EstadoPlanilla, FilingPeriod, SessionContext, TipoPlanilla};
use planilla_aportes::importer::PlanillaImporter;
use planilla_aportes::logging;
use planilla_aportes::repository::{PlanillaRepository, SubmissionError};
use planilla_aportes::workflow::{
    AlertSeverity, ImportWizard, ParseOutcome, PlanillaRevision, RevisionError, SelectedFile,
    SubmitOutcome, WizardState, WorkflowError,
};
use std::sync::Arc;
use test_helpers::RecordingPresenter;

const COD_PATRONAL: &str = "01-730-00001";

fn marzo_2025() -> FilingPeriod {
    FilingPeriod::new(3, 2025, TipoPlanilla::Mensual).unwrap()
}

async fn check(
    repository: &PlanillaRepository,
    session: &SessionContext,
    raw_id: &str,
) -> AccessDecision {
    PlanillaAccessPolicy::check(session, raw_id, repository)
        .await
        .unwrap()
}

fn wizard_for(cod_patronal: &str, presenter: Arc<RecordingPresenter>) -> ImportWizard {
    ImportWizard::new(test_helpers::empleador_session(cod_patronal), presenter)
}

#[tokio::test]
async fn test_declaracion_flow_persists_planilla() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let importer = PlanillaImporter::default();
    let presenter = Arc::new(RecordingPresenter::default());
    let mut wizard = wizard_for(COD_PATRONAL, presenter.clone());

    wizard.select_period(marzo_2025()).unwrap();
    wizard
        .select_file(SelectedFile::from_path(test_helpers::fixture(
            "01_planilla_valida.csv",
        )))
        .unwrap();

    assert_eq!(
        wizard.run_import(&importer).await.unwrap(),
        ParseOutcome::Accepted
    );
    assert_eq!(wizard.planilla().unwrap().totals.total_trabajadores, 2);

    let receipt = match wizard.submit(&repository).await.unwrap() {
        SubmitOutcome::Submitted(receipt) => receipt,
        SubmitOutcome::Failed(err) => panic!("提交应该成功: {}", err),
    };
    assert!(receipt.id_planilla > 0);
    assert_eq!(receipt.mensaje, "Planilla registrada con 2 trabajadores.");

    // 成功后清空选择
    assert!(matches!(wizard.state(), WizardState::Idle));
    assert!(wizard.period().is_none());

    let alert = presenter.last().unwrap();
    assert_eq!(alert.severity, AlertSeverity::Success);
    assert_eq!(alert.timer_ms, Some(2000));

    let planillas = repository
        .list_by_cod_patronal(COD_PATRONAL, Some("03"), Some(2025))
        .unwrap();
    assert_eq!(planillas.len(), 1);
    assert_eq!(planillas[0].total_trabajadores, 2);
    assert_eq!(planillas[0].total_importe, 7851.25);
    assert_eq!(planillas[0].usuario_creacion, "empresa01");
    assert_eq!(repository.count_detalle(receipt.id_planilla).unwrap(), 2);

    let detalle = repository.list_detalle(receipt.id_planilla).unwrap();
    assert_eq!(detalle[0].numero_documento.as_deref(), Some("1234567"));
    assert_eq!(detalle[1].regional.as_deref(), Some("Cochabamba"));
}

#[tokio::test]
async fn test_duplicate_declaracion_keeps_planilla_ready() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let importer = PlanillaImporter::default();
    let presenter = Arc::new(RecordingPresenter::default());

    for _ in 0..2 {
        let mut wizard = wizard_for(COD_PATRONAL, presenter.clone());
        wizard.select_period(marzo_2025()).unwrap();
        wizard
            .select_file(SelectedFile::from_path(test_helpers::fixture(
                "01_planilla_valida.csv",
            )))
            .unwrap();
        wizard.run_import(&importer).await.unwrap();

        if let SubmitOutcome::Failed(err) = wizard.submit(&repository).await.unwrap() {
            assert!(matches!(err, SubmissionError::Duplicate(_)));
            // 失败后保留校验结果，可重新提交
            assert!(matches!(wizard.state(), WizardState::ReadyToSubmit { .. }));
            assert!(wizard.period().is_some());
        }
    }

    let alerts = presenter.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].severity, AlertSeverity::Success);
    assert_eq!(alerts[1].severity, AlertSeverity::Error);
    assert_eq!(alerts[1].title, "Planilla Duplicada");
    assert_eq!(
        alerts[1].body,
        "Ya existe una planilla para este mes y gestión."
    );

    // 同期只保存一次
    let planillas = repository
        .list_by_cod_patronal(COD_PATRONAL, None, None)
        .unwrap();
    assert_eq!(planillas.len(), 1);
}

#[tokio::test]
async fn test_other_tipo_planilla_is_not_duplicate() {
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let importer = PlanillaImporter::default();

    for tipo in [TipoPlanilla::Mensual, TipoPlanilla::Reintegro] {
        let mut wizard = wizard_for(COD_PATRONAL, Arc::new(RecordingPresenter::default()));
        wizard
            .select_period(FilingPeriod::new(3, 2025, tipo).unwrap())
            .unwrap();
        wizard
            .select_file(SelectedFile::from_path(test_helpers::fixture(
                "01_planilla_valida.csv",
            )))
            .unwrap();
        wizard.run_import(&importer).await.unwrap();
        assert!(matches!(
            wizard.submit(&repository).await.unwrap(),
            SubmitOutcome::Submitted(_)
        ));
    }

    assert_eq!(
        repository
            .list_by_cod_patronal(COD_PATRONAL, None, None)
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_rejected_file_shows_all_errors_and_is_not_submittable() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let presenter = Arc::new(RecordingPresenter::default());
    let mut wizard = wizard_for(COD_PATRONAL, presenter.clone());

    wizard.select_period(marzo_2025()).unwrap();
    wizard
        .select_file(SelectedFile::from_path(test_helpers::fixture(
            "04_errores_fila.csv",
        )))
        .unwrap();

    assert_eq!(
        wizard.run_import(&PlanillaImporter::default()).await.unwrap(),
        ParseOutcome::Rejected
    );
    assert_eq!(wizard.validation_errors().len(), 3);

    let alert = presenter.last().unwrap();
    assert_eq!(alert.severity, AlertSeverity::Error);
    assert_eq!(alert.title, "Errores en la planilla");
    assert_eq!(alert.body.lines().count(), 3);

    // 校验失败状态下不可提交
    let err = wizard.submit(&repository).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    wizard.acknowledge_errors().unwrap();
    assert!(matches!(wizard.state(), WizardState::Idle));
    assert!(repository
        .list_by_cod_patronal(COD_PATRONAL, None, None)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_submit_without_period_asks_for_selection() {
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let presenter = Arc::new(RecordingPresenter::default());
    let mut wizard = wizard_for(COD_PATRONAL, presenter.clone());

    let bytes = std::fs::read(test_helpers::fixture("01_planilla_valida.csv")).unwrap();
    wizard
        .select_file(SelectedFile::from_bytes("planilla.csv", bytes))
        .unwrap();
    wizard.run_import(&PlanillaImporter::default()).await.unwrap();

    let err = wizard.submit(&repository).await.unwrap_err();
    assert_eq!(err, WorkflowError::MissingPeriod);
    assert_eq!(presenter.last().unwrap().title, "Datos incompletos");

    // 补选期间后可继续提交
    assert!(matches!(wizard.state(), WizardState::ReadyToSubmit { .. }));
    wizard.select_period(marzo_2025()).unwrap();
    assert!(matches!(
        wizard.submit(&repository).await.unwrap(),
        SubmitOutcome::Submitted(_)
    ));
}

#[tokio::test]
async fn test_access_policy_over_persisted_planillas() {
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();

    let mut wizard = wizard_for(COD_PATRONAL, Arc::new(RecordingPresenter::default()));
    wizard.select_period(marzo_2025()).unwrap();
    wizard
        .select_file(SelectedFile::from_path(test_helpers::fixture(
            "01_planilla_valida.csv",
        )))
        .unwrap();
    wizard.run_import(&PlanillaImporter::default()).await.unwrap();
    let id = match wizard.submit(&repository).await.unwrap() {
        SubmitOutcome::Submitted(receipt) => receipt.id_planilla.to_string(),
        SubmitOutcome::Failed(err) => panic!("提交应该成功: {}", err),
    };

    let owner = test_helpers::empleador_session(COD_PATRONAL);
    let other = test_helpers::empleador_session("01-730-99999");
    let admin = test_helpers::admin_session();

    assert_eq!(check(&repository, &owner, &id).await, AccessDecision::Allowed);
    assert_eq!(check(&repository, &other, &id).await, AccessDecision::Denied);
    assert_eq!(check(&repository, &admin, &id).await, AccessDecision::Allowed);
    assert_eq!(check(&repository, &owner, "9999").await, AccessDecision::NotFound);
    assert_eq!(check(&repository, &owner, "abc").await, AccessDecision::InvalidId);
    assert_eq!(check(&repository, &owner, "-1").await, AccessDecision::InvalidId);
}

async fn submit_marzo(repository: &PlanillaRepository) -> i64 {
    let mut wizard = wizard_for(COD_PATRONAL, Arc::new(RecordingPresenter::default()));
    wizard.select_period(marzo_2025()).unwrap();
    wizard
        .select_file(SelectedFile::from_path(test_helpers::fixture(
            "01_planilla_valida.csv",
        )))
        .unwrap();
    wizard.run_import(&PlanillaImporter::default()).await.unwrap();
    match wizard.submit(repository).await.unwrap() {
        SubmitOutcome::Submitted(receipt) => receipt.id_planilla,
        SubmitOutcome::Failed(err) => panic!("提交应该成功: {}", err),
    }
}

fn estado_of(repository: &PlanillaRepository) -> EstadoPlanilla {
    repository
        .list_by_cod_patronal(COD_PATRONAL, None, None)
        .unwrap()[0]
        .estado
}

#[tokio::test]
async fn test_declaracion_and_review_lifecycle() {
    logging::init_test();

    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let id = submit_marzo(&repository).await;
    assert_eq!(estado_of(&repository), EstadoPlanilla::Borrador);

    let presenter = Arc::new(RecordingPresenter::default());
    let empleador = PlanillaRevision::new(
        test_helpers::empleador_session(COD_PATRONAL),
        presenter.clone(),
    );
    let admin = PlanillaRevision::new(test_helpers::admin_session(), presenter.clone());

    // Borrador → Pendiente
    assert_eq!(
        empleador.declarar(id, &repository).await.unwrap(),
        EstadoPlanilla::Pendiente
    );
    let summary = &repository
        .list_by_cod_patronal(COD_PATRONAL, None, None)
        .unwrap()[0];
    assert_eq!(summary.estado, EstadoPlanilla::Pendiente);
    assert!(summary.fecha_declarada.is_some());

    // 退回必须填写意见
    let err = admin
        .actualizar_estado(id, EstadoPlanilla::Observada, Some(" "), &repository)
        .await
        .unwrap_err();
    assert!(matches!(err, RevisionError::ObservacionesRequeridas));
    assert_eq!(presenter.last().unwrap().title, "Observaciones requeridas");
    assert_eq!(estado_of(&repository), EstadoPlanilla::Pendiente);

    // Pendiente → Observada
    admin
        .actualizar_estado(
            id,
            EstadoPlanilla::Observada,
            Some("Regional incorrecta para MARIA"),
            &repository,
        )
        .await
        .unwrap();
    let summary = &repository
        .list_by_cod_patronal(COD_PATRONAL, None, None)
        .unwrap()[0];
    assert_eq!(summary.estado, EstadoPlanilla::Observada);
    assert_eq!(
        summary.observaciones.as_deref(),
        Some("Regional incorrecta para MARIA")
    );

    // Observada → Pendiente → Aprobada
    empleador.declarar(id, &repository).await.unwrap();
    admin
        .actualizar_estado(id, EstadoPlanilla::Aprobada, None, &repository)
        .await
        .unwrap();
    assert_eq!(estado_of(&repository), EstadoPlanilla::Aprobada);
    let alert = presenter.last().unwrap();
    assert_eq!(alert.severity, AlertSeverity::Success);
    assert_eq!(alert.title, "Planilla aprobada");

    // 已通过的申报表不可再次申报
    let err = empleador.declarar(id, &repository).await.unwrap_err();
    assert!(matches!(
        err,
        RevisionError::InvalidTransition {
            from: EstadoPlanilla::Aprobada,
            to: EstadoPlanilla::Pendiente
        }
    ));
}

#[tokio::test]
async fn test_review_permissions_over_persisted_planilla() {
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repository = PlanillaRepository::new(&db_path).unwrap();
    let id = submit_marzo(&repository).await;
    let presenter = Arc::new(RecordingPresenter::default());

    // 其他雇主不可申报
    let other = PlanillaRevision::new(
        test_helpers::empleador_session("01-730-99999"),
        presenter.clone(),
    );
    assert!(matches!(
        other.declarar(id, &repository).await.unwrap_err(),
        RevisionError::Forbidden { .. }
    ));

    // 雇主不可审核自己的申报表
    let empleador = PlanillaRevision::new(
        test_helpers::empleador_session(COD_PATRONAL),
        presenter.clone(),
    );
    empleador.declarar(id, &repository).await.unwrap();
    assert!(matches!(
        empleador
            .actualizar_estado(id, EstadoPlanilla::Aprobada, None, &repository)
            .await
            .unwrap_err(),
        RevisionError::Forbidden { .. }
    ));

    let admin = PlanillaRevision::new(test_helpers::admin_session(), presenter.clone());
    assert!(matches!(
        admin
            .actualizar_estado(9999, EstadoPlanilla::Aprobada, None, &repository)
            .await
            .unwrap_err(),
        RevisionError::NotFound(9999)
    ));
    assert_eq!(estado_of(&repository), EstadoPlanilla::Pendiente);
}
