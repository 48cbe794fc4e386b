// Run controller: one full report pass per profile/month. An expired session triggers
// re-authentication and a restart of the whole pass, a bounded number of times.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::backend::Authenticator;
use crate::config::AppConfig;
use crate::error::ReportError;
use crate::models::{ReportMonth, Section};
use crate::output::{ChartRenderer, SheetWriter};
use crate::report::ReportBuilder;

/// Session source and output sinks for the controller.
pub struct ControllerDeps {
    pub authenticator: Arc<dyn Authenticator>,
    pub writer: Box<dyn SheetWriter>,
    pub renderer: Box<dyn ChartRenderer>,
}

/// Pass settings taken from the app config.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub output_directory: PathBuf,
    pub period_seconds: u32,
    pub network_capacity_mbps: f64,
    /// Re-authentications allowed per profile before the profile fails.
    pub max_reauth_attempts: u32,
}

impl From<&AppConfig> for ControllerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_directory: PathBuf::from(&config.output.directory),
            period_seconds: config.backend.period_seconds,
            network_capacity_mbps: config.report.network_capacity_mbps,
            max_reauth_attempts: config.auth.max_reauth_attempts,
        }
    }
}

/// What one successful pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub profile: String,
    pub month: String,
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub row_counts: Vec<(Section, usize)>,
    /// Re-authentications this pass needed.
    pub reauth_attempts: u32,
}

impl RunSummary {
    pub fn rows(&self, section: Section) -> usize {
        self.row_counts
            .iter()
            .find(|(s, _)| *s == section)
            .map_or(0, |(_, n)| *n)
    }

    fn log(&self) {
        for (section, rows) in &self.row_counts {
            info!(
                profile = %self.profile,
                section = section.sheet_name(),
                rows,
                "section rows"
            );
        }
        for file in &self.files {
            info!(profile = %self.profile, path = %file.display(), "report written");
        }
    }
}

pub struct RunController {
    deps: ControllerDeps,
    config: ControllerConfig,
}

impl RunController {
    pub fn new(deps: ControllerDeps, config: ControllerConfig) -> Self {
        Self { deps, config }
    }

    /// `{directory}/monthly-reports-{MM-YYYY}/{profile}-{MM-YYYY}`
    pub fn output_dir(&self, profile: &str, month: &ReportMonth) -> PathBuf {
        let label = month.label();
        self.config
            .output_directory
            .join(format!("monthly-reports-{label}"))
            .join(format!("{profile}-{label}"))
    }

    /// Runs the pass for one profile, restarting it from scratch after each
    /// successful re-authentication.
    #[instrument(skip(self, month), fields(month = %month.label()))]
    pub async fn run_profile(
        &self,
        profile: &str,
        month: &ReportMonth,
    ) -> Result<RunSummary, ReportError> {
        let mut attempts = 0u32;
        loop {
            match self.run_once(profile, month).await {
                Err(e) if e.is_expired_credentials() => {
                    if attempts >= self.config.max_reauth_attempts {
                        return Err(ReportError::CredentialsExhausted {
                            profile: profile.to_string(),
                            attempts,
                        });
                    }
                    attempts += 1;
                    warn!(profile, attempt = attempts, "session expired, re-authenticating");
                    self.deps
                        .authenticator
                        .reauthenticate(profile)
                        .await
                        .map_err(|source| ReportError::Reauthentication {
                            profile: profile.to_string(),
                            source,
                        })?;
                }
                Ok(mut summary) => {
                    summary.reauth_attempts = attempts;
                    return Ok(summary);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_once(&self, profile: &str, month: &ReportMonth) -> Result<RunSummary, ReportError> {
        let session = self.deps.authenticator.open_session(profile).await?;
        let output_dir = self.output_dir(profile, month);
        info!(profile, dir = %output_dir.display(), "starting report pass");

        let report = ReportBuilder::new(
            session.as_ref(),
            self.deps.renderer.as_ref(),
            month,
            self.config.period_seconds,
            self.config.network_capacity_mbps,
            &output_dir,
        )
        .build()
        .await?;

        let row_counts: Vec<(Section, usize)> = Section::ALL
            .iter()
            .map(|s| (*s, report.row_count(*s)))
            .collect();
        let stem = format!("Consolidated_report_{profile}_{}", month.file_stamp());
        let files = self
            .deps
            .writer
            .write(&output_dir, &stem, &report.finalize())?;

        Ok(RunSummary {
            profile: profile.to_string(),
            month: month.label(),
            output_dir,
            files,
            row_counts,
            reauth_attempts: 0,
        })
    }

    /// Every profile in order. A failing profile is logged and the next one still runs.
    pub async fn run_all(
        &self,
        profiles: &[String],
        month: &ReportMonth,
    ) -> Vec<Result<RunSummary, ReportError>> {
        let mut results = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let result = self.run_profile(profile, month).await;
            match &result {
                Ok(summary) => summary.log(),
                Err(e) => error!(profile = %profile, error = %e, "profile run failed"),
            }
            results.push(result);
        }
        results
    }
}
