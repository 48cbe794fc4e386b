use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Http,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    #[serde(default)]
    pub base_url: String,
    /// JSON export read by the fixture backend.
    #[serde(default)]
    pub fixture_path: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt, for timeouts, connect errors, 429 and 5xx.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_period_seconds")]
    pub period_seconds: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_period_seconds() -> u32 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Env var holding a bearer token; takes precedence over the token file.
    #[serde(default)]
    pub token_env: Option<String>,
    /// Directory with one `<profile>.token` file per profile.
    #[serde(default = "default_token_dir")]
    pub token_dir: String,
    /// argv run to refresh an expired session; `{profile}` is substituted. The command
    /// must leave a new token behind: either rewrite `<token_dir>/<profile>.token` itself
    /// or print the token on stdout with `login_prints_token` set.
    #[serde(default = "default_login_command")]
    pub login_command: Vec<String>,
    /// Take the last non-empty stdout line of the login command as the new token.
    #[serde(default)]
    pub login_prints_token: bool,
    /// Full-run retries after an expired session, per profile.
    #[serde(default = "default_max_reauth_attempts")]
    pub max_reauth_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: None,
            token_dir: default_token_dir(),
            login_command: default_login_command(),
            login_prints_token: false,
            max_reauth_attempts: default_max_reauth_attempts(),
        }
    }
}

fn default_token_dir() -> String {
    ".tokens".into()
}

fn default_login_command() -> Vec<String> {
    ["aws", "sso", "login", "--profile", "{profile}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_reauth_attempts() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    #[serde(default = "default_sheet_format")]
    pub format: SheetFormat,
    #[serde(default = "default_charts")]
    pub charts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: default_sheet_format(),
            charts: default_charts(),
        }
    }
}

fn default_output_directory() -> String {
    ".".into()
}

fn default_sheet_format() -> SheetFormat {
    SheetFormat::Xlsx
}

fn default_charts() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Reported as VM network capacity when no bandwidth maximum is available.
    #[serde(default = "default_network_capacity_mbps")]
    pub network_capacity_mbps: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            network_capacity_mbps: default_network_capacity_mbps(),
        }
    }
}

fn default_network_capacity_mbps() -> f64 {
    1000.0
}

impl AppConfig {
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let path = path
            .map(str::to_string)
            .or_else(|| std::env::var("CONFIG_FILE").ok())
            .unwrap_or_else(|| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.backend.kind {
            BackendKind::Http => anyhow::ensure!(
                !self.backend.base_url.is_empty(),
                "backend.base_url must be non-empty for kind = \"http\""
            ),
            BackendKind::Fixture => anyhow::ensure!(
                self.backend
                    .fixture_path
                    .as_deref()
                    .is_some_and(|p| !p.is_empty()),
                "backend.fixture_path must be set for kind = \"fixture\""
            ),
        }
        anyhow::ensure!(
            self.backend.timeout_secs > 0,
            "backend.timeout_secs must be > 0, got {}",
            self.backend.timeout_secs
        );
        anyhow::ensure!(
            self.backend.max_retries <= 10,
            "backend.max_retries must be <= 10, got {}",
            self.backend.max_retries
        );
        anyhow::ensure!(
            self.backend.period_seconds > 0 && self.backend.period_seconds % 60 == 0,
            "backend.period_seconds must be a positive multiple of 60, got {}",
            self.backend.period_seconds
        );
        anyhow::ensure!(
            !self.auth.login_command.is_empty(),
            "auth.login_command must be non-empty"
        );
        anyhow::ensure!(
            self.auth.max_reauth_attempts <= 3,
            "auth.max_reauth_attempts must be <= 3, got {}",
            self.auth.max_reauth_attempts
        );
        anyhow::ensure!(
            !self.output.directory.is_empty(),
            "output.directory must be non-empty"
        );
        anyhow::ensure!(
            self.report.network_capacity_mbps > 0.0,
            "report.network_capacity_mbps must be > 0, got {}",
            self.report.network_capacity_mbps
        );
        Ok(())
    }
}
