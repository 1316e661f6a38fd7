// ==========================================
// 缴费申报系统 - 命令行入口
// ==========================================
// 命令: validar（校验）/ plantilla（模板）/ declarar（导入入库）/ presentar（申报）
//       revisar（审核）/ listar / configurar
// 输出: 结果以 JSON 打印到 stdout，日志写入 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use planilla_aportes::config::{ConfigManager, ImportConfigReader};
use planilla_aportes::domain::{EstadoPlanilla, FilingPeriod, Rol, SessionContext, TipoPlanilla};
use planilla_aportes::importer::{PlanillaImport, PlanillaImporter};
use planilla_aportes::logging::{self, LogFormat};
use planilla_aportes::repository::PlanillaRepository;
use planilla_aportes::workflow::{
    ImportWizard, ParseOutcome, PlanillaRevision, SelectedFile, SubmitOutcome,
    TracingAlertPresenter,
};
use planilla_aportes::{get_default_db_path, i18n, template, ImportConfig, DB_PATH_ENV};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "planilla-aportes")]
#[command(about = "Importación, validación y declaración de planillas de aportes")]
#[command(version)]
struct Cli {
    /// Ruta de la base de datos SQLite
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<PathBuf>,

    /// Idioma de los mensajes (es | en)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Logs en formato JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Valida una planilla sin declararla
    Validar {
        archivo: PathBuf,
    },

    /// Genera la plantilla vacía (CSV); "-" escribe a stdout
    Plantilla {
        salida: PathBuf,
    },

    /// Valida y declara una planilla para un periodo
    Declarar {
        archivo: PathBuf,
        #[arg(long)]
        mes: u32,
        #[arg(long)]
        gestion: i32,
        #[arg(long, default_value = "Mensual")]
        tipo: String,
        #[arg(long)]
        cod_patronal: String,
        #[arg(long)]
        usuario: String,
        #[arg(long, default_value = "")]
        nombre: String,
        #[arg(long, default_value = "EMPRESA_COTIZACIONES_PRODUCCION")]
        rol: String,
    },

    /// Presenta una planilla en borrador u observada para su revisión
    Presentar {
        id_planilla: i64,
        #[arg(long)]
        cod_patronal: String,
        #[arg(long)]
        usuario: String,
        #[arg(long, default_value = "")]
        nombre: String,
        #[arg(long, default_value = "EMPRESA_COTIZACIONES_PRODUCCION")]
        rol: String,
    },

    /// Aprueba u observa una planilla pendiente (administrador)
    Revisar {
        id_planilla: i64,
        /// aprobar | observar
        #[arg(long)]
        estado: String,
        #[arg(long)]
        observaciones: Option<String>,
        #[arg(long)]
        usuario: String,
        #[arg(long, default_value = "")]
        nombre: String,
        #[arg(long, default_value = "ADMIN_COTIZACIONES_PRODUCCION")]
        rol: String,
    },

    /// Lista las planillas declaradas de un empleador
    Listar {
        #[arg(long)]
        cod_patronal: String,
        #[arg(long)]
        mes: Option<u32>,
        #[arg(long)]
        gestion: Option<i32>,
    },

    /// Guarda un parámetro de importación (p. ej. import.decimal_precision)
    Configurar {
        clave: String,
        valor: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    info!(db_path = %db_path, version = planilla_aportes::VERSION, "启动");

    let config_manager = ConfigManager::new(&db_path)
        .map_err(|e| anyhow!(e))
        .context("No se pudo abrir la configuración")?;
    let mut config: ImportConfig = config_manager
        .load_import_config()
        .await
        .map_err(|e| anyhow!(e))?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    i18n::set_locale(&config.locale);

    match cli.command {
        Command::Validar { archivo } => {
            let importer = PlanillaImporter::new(config);
            let result = importer.import_file(&archivo).await?;
            print_json(&result)?;
            Ok(if result.is_accepted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Plantilla { salida } => {
            if salida.as_os_str() == "-" {
                template::write_template(std::io::stdout().lock())?;
            } else {
                let file = std::fs::File::create(&salida)
                    .with_context(|| format!("No se pudo crear {}", salida.display()))?;
                template::write_template(file)?;
                info!(path = %salida.display(), "模板已生成");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Declarar {
            archivo,
            mes,
            gestion,
            tipo,
            cod_patronal,
            usuario,
            nombre,
            rol,
        } => {
            let tipo_planilla = TipoPlanilla::parse(&tipo)
                .ok_or_else(|| anyhow!("Tipo de planilla desconocido: {}", tipo))?;
            let period = FilingPeriod::new(mes, gestion, tipo_planilla)
                .ok_or_else(|| anyhow!("Mes inválido: {}", mes))?;
            let session = session_from_args(usuario, nombre, cod_patronal, &rol);

            let locale = config.locale.clone();
            let importer = PlanillaImporter::new(config);
            let repository = PlanillaRepository::new(&db_path)?;
            let mut wizard =
                ImportWizard::new(session, Arc::new(TracingAlertPresenter)).with_locale(&locale);

            wizard.select_period(period)?;
            wizard.select_file(SelectedFile::from_path(&archivo))?;

            match wizard.run_import(&importer).await? {
                ParseOutcome::Accepted => {}
                ParseOutcome::Rejected => {
                    print_json(&json!({
                        "status": "REJECTED",
                        "errors": wizard.validation_errors(),
                    }))?;
                    return Ok(ExitCode::FAILURE);
                }
                ParseOutcome::ReadFailed => {
                    print_json(&json!({
                        "status": "READ_FAILED",
                        "error": wizard.read_error(),
                    }))?;
                    return Ok(ExitCode::FAILURE);
                }
                ParseOutcome::Stale => bail!("Resultado de importación descartado"),
            }

            match wizard.submit(&repository).await? {
                SubmitOutcome::Submitted(receipt) => {
                    print_json(&receipt)?;
                    Ok(ExitCode::SUCCESS)
                }
                SubmitOutcome::Failed(err) => {
                    print_json(&json!({
                        "status": "FAILED",
                        "error": err.to_string(),
                    }))?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Presentar {
            id_planilla,
            cod_patronal,
            usuario,
            nombre,
            rol,
        } => {
            let repository = PlanillaRepository::new(&db_path)?;
            let revision = PlanillaRevision::new(
                session_from_args(usuario, nombre, cod_patronal, &rol),
                Arc::new(TracingAlertPresenter),
            )
            .with_locale(&config.locale);

            let result = revision.declarar(id_planilla, &repository).await;
            print_revision(id_planilla, result)
        }

        Command::Revisar {
            id_planilla,
            estado,
            observaciones,
            usuario,
            nombre,
            rol,
        } => {
            let estado = EstadoPlanilla::parse(&estado)
                .ok_or_else(|| anyhow!("Estado desconocido: {}", estado))?;
            let repository = PlanillaRepository::new(&db_path)?;
            let revision = PlanillaRevision::new(
                session_from_args(usuario, nombre, String::new(), &rol),
                Arc::new(TracingAlertPresenter),
            )
            .with_locale(&config.locale);

            let result = revision
                .actualizar_estado(id_planilla, estado, observaciones.as_deref(), &repository)
                .await;
            print_revision(id_planilla, result)
        }

        Command::Listar {
            cod_patronal,
            mes,
            gestion,
        } => {
            let repository = PlanillaRepository::new(&db_path)?;
            let mes = mes.map(|m| format!("{:02}", m));
            let planillas = repository.list_by_cod_patronal(&cod_patronal, mes.as_deref(), gestion)?;
            print_json(&planillas)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Configurar { clave, valor } => {
            config_manager
                .set_global_config_value(&clave, &valor)
                .map_err(|e| anyhow!(e))?;
            let mut saved = serde_json::Map::new();
            saved.insert(clave, serde_json::Value::String(valor));
            print_json(&saved)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn session_from_args(
    usuario: String,
    nombre: String,
    cod_patronal: String,
    rol: &str,
) -> SessionContext {
    SessionContext {
        nombre_completo: if nombre.trim().is_empty() {
            usuario.clone()
        } else {
            nombre
        },
        usuario,
        cod_patronal,
        nombre_empresa: String::new(),
        rol: Rol::parse(rol),
    }
}

fn print_revision<E: std::fmt::Display>(
    id_planilla: i64,
    result: std::result::Result<EstadoPlanilla, E>,
) -> Result<ExitCode> {
    match result {
        Ok(estado) => {
            print_json(&json!({ "id_planilla": id_planilla, "estado": estado }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_json(&json!({
                "status": "FAILED",
                "id_planilla": id_planilla,
                "error": err.to_string(),
            }))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
