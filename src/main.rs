//! Binary entry point for the `zonal-export` CLI.

mod cli;

use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use zonal_export::{
    ConfigError, EarthEngineBackend, EarthEngineConfig, EarthEngineError, ExportBackend,
    ExportHandle, ExportOrchestrator, ExportPlan, ExportStatus, ExportTableBody, PipelineError,
    RequestFactory, Variable, YearRange,
};

use cli::{Cli, Command, ExportCommand, StatusCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("backend error: {0}")]
    Backend(#[from] EarthEngineError),
    #[error("export failed: {0}")]
    Export(#[from] PipelineError<EarthEngineError>),
    #[error("failed to render request body: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Export(args) => export_command(&args).await,
        Command::Status(args) => status_command(&args).await,
    }
}

fn init_logging(verbose: bool) -> Result<(), CliError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| CliError::Logging(err.to_string()))
}

async fn export_command(args: &ExportCommand) -> Result<(), CliError> {
    let plan = plan_from_args(args)?;
    let config = EarthEngineConfig::load_without_cli_args()?;

    if args.dry_run {
        return dry_run(config, &plan, args.out_dir.as_deref());
    }

    let backend = EarthEngineBackend::new(&config)?;
    let orchestrator = ExportOrchestrator::new(backend, config);
    let handles = orchestrator.execute(&plan).await?;
    write_handles(io::stdout(), &handles);
    Ok(())
}

fn plan_from_args(args: &ExportCommand) -> Result<ExportPlan, CliError> {
    let variables = args
        .variables
        .iter()
        .map(|name| name.parse::<Variable>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| CliError::Argument(err.to_string()))?;
    let plan = if variables.is_empty() {
        ExportPlan::all()
    } else {
        ExportPlan::for_variables(&variables)
    };

    let Some(text) = args.years.as_deref() else {
        return Ok(plan);
    };
    let years: YearRange = text
        .parse()
        .map_err(|err| CliError::Argument(format!("--years {text}: {err}")))?;
    Ok(plan.with_years(&years))
}

fn dry_run(
    config: EarthEngineConfig,
    plan: &ExportPlan,
    out_dir: Option<&Utf8Path>,
) -> Result<(), CliError> {
    let requests = RequestFactory::new(config).prepare_all::<EarthEngineError>(plan)?;
    let bodies: Vec<(String, ExportTableBody)> = requests
        .iter()
        .map(|request| {
            (
                request.file_name_prefix.clone(),
                ExportTableBody::new(request, Uuid::new_v4().to_string()),
            )
        })
        .collect();

    if let Some(dir) = out_dir {
        write_bodies(dir, &bodies)?;
    }

    let rendered: Vec<&ExportTableBody> = bodies.iter().map(|(_, body)| body).collect();
    let json = serde_json::to_string_pretty(&rendered)?;
    writeln!(io::stdout(), "{json}").ok();
    Ok(())
}

fn write_bodies(dir: &Utf8Path, bodies: &[(String, ExportTableBody)]) -> Result<(), CliError> {
    let dir_error = |err: io::Error| CliError::Write {
        path: dir.to_string(),
        message: err.to_string(),
    };
    Dir::create_ambient_dir_all(dir, ambient_authority()).map_err(dir_error)?;
    let target = Dir::open_ambient_dir(dir, ambient_authority()).map_err(dir_error)?;
    for (prefix, body) in bodies {
        let file_name = format!("{prefix}.json");
        let json = serde_json::to_string_pretty(body)?;
        target
            .write(&file_name, json)
            .map_err(|err| CliError::Write {
                path: dir.join(&file_name).to_string(),
                message: err.to_string(),
            })?;
    }
    Ok(())
}

async fn status_command(args: &StatusCommand) -> Result<(), CliError> {
    let config = EarthEngineConfig::load_without_cli_args()?;
    let backend = EarthEngineBackend::new(&config)?;
    let status = backend.status(&args.operation).await?;
    write_status(io::stdout(), &status);
    Ok(())
}

fn write_handles(mut target: impl Write, handles: &[ExportHandle]) {
    for handle in handles {
        writeln!(
            target,
            "{}\t{}\t{}",
            handle.variable, handle.operation, handle.description
        )
        .ok();
    }
}

fn write_status(mut target: impl Write, status: &ExportStatus) {
    writeln!(target, "operation: {}", status.operation).ok();
    writeln!(target, "state: {}", status.state).ok();
    if let Some(description) = &status.description {
        writeln!(target, "description: {description}").ok();
    }
    writeln!(target, "done: {}", status.done).ok();
    if let Some(error) = &status.error {
        writeln!(target, "error: {error}").ok();
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_args(variables: &[&str], years: Option<&str>) -> ExportCommand {
        ExportCommand {
            variables: variables.iter().map(|name| (*name).to_owned()).collect(),
            years: years.map(str::to_owned),
            dry_run: true,
            out_dir: None,
        }
    }

    #[test]
    fn plan_defaults_to_every_variable() {
        let plan = plan_from_args(&export_args(&[], None))
            .unwrap_or_else(|err| panic!("plan: {err}"));
        assert_eq!(plan, ExportPlan::all());
    }

    #[test]
    fn plan_narrows_years_for_selected_variables() {
        let plan = plan_from_args(&export_args(&["nightlight"], Some("2014-2016")))
            .unwrap_or_else(|err| panic!("plan: {err}"));
        let [(variable, years)] = plan.entries() else {
            panic!("expected one entry: {plan:?}");
        };
        assert_eq!(*variable, Variable::Nightlight);
        assert_eq!(years.years(), &[2014, 2015, 2016]);
    }

    #[test]
    fn plan_rejects_malformed_years() {
        let err = plan_from_args(&export_args(&[], Some("twenty")))
            .expect_err("years must be numeric");
        assert!(
            matches!(err, CliError::Argument(ref message) if message.contains("--years")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn write_status_includes_failure_message() {
        let mut buf = Vec::new();
        write_status(
            &mut buf,
            &ExportStatus {
                operation: String::from("projects/p/operations/X"),
                state: String::from("FAILED"),
                description: Some(String::from("Cropland_Punjab_Buffer_AllYears")),
                done: true,
                error: Some(String::from("Asset not found")),
            },
        );
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(rendered.contains("state: FAILED"), "rendered: {rendered}");
        assert!(
            rendered.contains("error: Asset not found"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn write_handles_lists_one_line_per_export() {
        let mut buf = Vec::new();
        write_handles(
            &mut buf,
            &[ExportHandle {
                operation: String::from("projects/p/operations/A"),
                variable: Variable::Builtup,
                description: String::from("Builtup_Punjab_Buffer_AllYears"),
            }],
        );
        let rendered = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            rendered,
            "builtup\tprojects/p/operations/A\tBuiltup_Punjab_Buffer_AllYears\n"
        );
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        write_error(&mut buf, &CliError::Argument(String::from("bad")));
        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("invalid argument: bad"),
            "rendered: {rendered}"
        );
    }
}
