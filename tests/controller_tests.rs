// Run controller: re-authentication bound, per-profile isolation and output layout

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use common::*;
use utilization_report::backend::{
    Authenticator, CloudBackend, FixtureAuthenticator, FixtureBackend, FixtureData,
};
use utilization_report::classifier;
use utilization_report::controller::{ControllerConfig, ControllerDeps, RunController};
use utilization_report::error::{BackendError, ReportError};
use utilization_report::models::Section;
use utilization_report::output::{CsvSheetWriter, NullChartRenderer, XlsxSheetWriter};

fn one_instance() -> FixtureData {
    let inst = instance("i-1", Some("web01"), Some("Windows"), 1);
    let profile = classifier::classify(&inst);
    let mut data = FixtureData {
        account_name: "prod".to_string(),
        instances: vec![inst],
        ..Default::default()
    };
    data.metrics.push(series(
        &classifier::cpu_metric(&profile),
        hourly(at(1, 0), 3, 30.0),
    ));
    data
}

fn config(dir: &std::path::Path, max_reauth_attempts: u32) -> ControllerConfig {
    ControllerConfig {
        output_directory: dir.to_path_buf(),
        period_seconds: 3600,
        network_capacity_mbps: 1000.0,
        max_reauth_attempts,
    }
}

fn controller(
    authenticator: Arc<dyn Authenticator>,
    writer: MemoryWriter,
    config: ControllerConfig,
) -> RunController {
    RunController::new(
        ControllerDeps {
            authenticator,
            writer: Box::new(writer),
            renderer: Box::new(NullChartRenderer),
        },
        config,
    )
}

#[tokio::test]
async fn test_expired_session_reauthenticates_and_restarts_the_pass() {
    let dir = tempfile::TempDir::new().unwrap();
    let auth = Arc::new(ScriptedAuthenticator::new(one_instance(), false, true));
    let writer = MemoryWriter::default();
    let controller = controller(auth.clone(), writer.clone(), config(dir.path(), 1));

    let summary = controller
        .run_profile("prod", &may_2024())
        .await
        .expect("second pass succeeds");

    assert_eq!(auth.reauth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(auth.sessions_opened.load(Ordering::SeqCst), 2);
    assert_eq!(summary.reauth_attempts, 1);
    assert_eq!(summary.rows(Section::ServerUtilization), 1);

    // Only the completed pass reaches the writer.
    let written = writer.written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].1, "Consolidated_report_prod_2024_05");
}

#[tokio::test]
async fn test_second_expiry_fails_the_profile() {
    let dir = tempfile::TempDir::new().unwrap();
    let auth = Arc::new(ScriptedAuthenticator::new(one_instance(), false, false));
    let writer = MemoryWriter::default();
    let controller = controller(auth.clone(), writer.clone(), config(dir.path(), 1));

    let err = controller.run_profile("prod", &may_2024()).await.unwrap_err();
    assert!(matches!(
        err,
        ReportError::CredentialsExhausted { ref profile, attempts: 1 } if profile == "prod"
    ));
    assert_eq!(auth.reauth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(auth.sessions_opened.load(Ordering::SeqCst), 2);
    assert!(writer.written.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_reauth_budget_fails_without_login() {
    let dir = tempfile::TempDir::new().unwrap();
    let auth = Arc::new(ScriptedAuthenticator::new(one_instance(), false, true));
    let controller = controller(auth.clone(), MemoryWriter::default(), config(dir.path(), 0));

    let err = controller.run_profile("prod", &may_2024()).await.unwrap_err();
    assert!(matches!(err, ReportError::CredentialsExhausted { attempts: 0, .. }));
    assert_eq!(auth.reauth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_valid_session_never_reauthenticates() {
    let dir = tempfile::TempDir::new().unwrap();
    let auth = Arc::new(ScriptedAuthenticator::new(one_instance(), true, true));
    let controller = controller(auth.clone(), MemoryWriter::default(), config(dir.path(), 1));

    let summary = controller.run_profile("prod", &may_2024()).await.unwrap();
    assert_eq!(summary.reauth_attempts, 0);
    assert_eq!(auth.sessions_opened.load(Ordering::SeqCst), 1);
    assert_eq!(
        summary.output_dir,
        dir.path().join("monthly-reports-05-2024").join("prod-05-2024")
    );
}

/// Fails every profile named "broken" with a non-credential error.
struct PickyAuthenticator {
    inner: FixtureAuthenticator,
}

#[async_trait]
impl Authenticator for PickyAuthenticator {
    async fn open_session(&self, profile: &str) -> Result<Arc<dyn CloudBackend>, BackendError> {
        if profile == "broken" {
            return Err(BackendError::Unavailable("no such profile".into()));
        }
        self.inner.open_session(profile).await
    }

    async fn reauthenticate(&self, profile: &str) -> Result<(), BackendError> {
        self.inner.reauthenticate(profile).await
    }
}

#[tokio::test]
async fn test_failed_profile_does_not_stop_the_next() {
    let dir = tempfile::TempDir::new().unwrap();
    let auth = Arc::new(PickyAuthenticator {
        inner: FixtureAuthenticator::new(FixtureBackend::new(one_instance())),
    });
    let writer = MemoryWriter::default();
    let controller = controller(auth, writer.clone(), config(dir.path(), 1));

    let profiles = vec!["broken".to_string(), "prod".to_string()];
    let results = controller.run_all(&profiles, &may_2024()).await;
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(ReportError::Backend(BackendError::Unavailable(_)))));
    assert_eq!(results[1].as_ref().unwrap().profile, "prod");
    assert_eq!(writer.written.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_xlsx_report_lands_in_month_folder() {
    let dir = tempfile::TempDir::new().unwrap();
    let controller = RunController::new(
        ControllerDeps {
            authenticator: Arc::new(FixtureAuthenticator::new(FixtureBackend::new(one_instance()))),
            writer: Box::new(XlsxSheetWriter),
            renderer: Box::new(NullChartRenderer),
        },
        config(dir.path(), 1),
    );

    let summary = controller.run_profile("prod", &may_2024()).await.unwrap();
    let expected = dir
        .path()
        .join("monthly-reports-05-2024")
        .join("prod-05-2024")
        .join("Consolidated_report_prod_2024_05.xlsx");
    assert_eq!(summary.files, vec![expected.clone()]);
    assert!(expected.exists());
}

#[tokio::test]
async fn test_csv_report_renders_missing_values_as_not_available() {
    let dir = tempfile::TempDir::new().unwrap();
    let controller = RunController::new(
        ControllerDeps {
            authenticator: Arc::new(FixtureAuthenticator::new(FixtureBackend::new(one_instance()))),
            writer: Box::new(CsvSheetWriter),
            renderer: Box::new(NullChartRenderer),
        },
        config(dir.path(), 1),
    );

    let summary = controller.run_profile("prod", &may_2024()).await.unwrap();
    assert_eq!(summary.files.len(), Section::ALL.len());

    let server_csv = summary.output_dir.join(CsvSheetWriter::file_name(
        "Consolidated_report_prod_2024_05",
        Section::ServerUtilization,
    ));
    let text = std::fs::read_to_string(server_csv).unwrap();
    let row = text.lines().nth(1).expect("one server row");
    assert_eq!(row, "i-1,web01,Windows,30,N/A,N/A,N/A,N/A,N/A");
}
