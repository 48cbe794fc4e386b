use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use utilization_report::backend::{
    Authenticator, FixtureAuthenticator, FixtureBackend, TokenAuthenticator,
};
use utilization_report::config::{AppConfig, BackendKind, SheetFormat};
use utilization_report::controller::{ControllerConfig, ControllerDeps, RunController};
use utilization_report::models::ReportMonth;
use utilization_report::output::{
    ChartRenderer, CsvSheetWriter, NullChartRenderer, SheetWriter, SvgChartRenderer,
    XlsxSheetWriter,
};
use utilization_report::{cli, version};

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn authenticator(config: &AppConfig) -> Result<Arc<dyn Authenticator>> {
    Ok(match config.backend.kind {
        BackendKind::Http => Arc::new(TokenAuthenticator::new(
            config.backend.clone(),
            config.auth.clone(),
        )),
        BackendKind::Fixture => {
            let path = config
                .backend
                .fixture_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("backend.fixture_path is not set"))?;
            Arc::new(FixtureAuthenticator::new(FixtureBackend::from_file(path)?))
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let args = cli::CliArgs::parse();
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned());
    let app_config = AppConfig::load(config_path.as_deref())?;

    let (profiles, month) = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout();
        let profiles = cli::resolve_profiles(&args.profiles, &mut input, &mut output)?;
        let month = cli::resolve_month(args.month.as_deref(), &mut input, &mut output)?;
        (profiles, month)
    };
    let month = match ReportMonth::parse(&month) {
        Ok(m) => m,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        ?profiles,
        month = %month.label(),
        "starting monthly report"
    );

    let writer: Box<dyn SheetWriter> = match app_config.output.format {
        SheetFormat::Xlsx => Box::new(XlsxSheetWriter),
        SheetFormat::Csv => Box::new(CsvSheetWriter),
    };
    let renderer: Box<dyn ChartRenderer> = if app_config.output.charts {
        Box::new(SvgChartRenderer)
    } else {
        Box::new(NullChartRenderer)
    };
    let controller = RunController::new(
        ControllerDeps {
            authenticator: authenticator(&app_config)?,
            writer,
            renderer,
        },
        ControllerConfig::from(&app_config),
    );

    let results = controller.run_all(&profiles, &month).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    anyhow::ensure!(
        failed == 0,
        "{failed} of {} profile run(s) failed",
        results.len()
    );
    Ok(())
}
