use crate::models::{
    AppConfig, CallerIdentity, Dimension, FixtureAccount, FixtureConfig, InjectedFailure,
    LogGroup, Metric, Operation, Role,
};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Environment, File, FileFormat};
use indexmap::IndexMap;
use std::fs;

/// Prefix of environment variables overriding `Settings.yaml`
pub const ENV_PREFIX: &str = "CLOUDPANE";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files:
/// - Settings (`Settings.yaml`): logging, frame timer, paging and graph settings
/// - Fixture (`Fixture.yaml` by default): accounts served by the simulated service
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "cloudpane Data")
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join("Settings.yaml"),
            config_dir,
        })
    }

    /// Load `Settings.yaml`, overlaid with `CLOUDPANE_*` environment variables.
    ///
    /// # Returns
    /// The loaded AppConfig; missing file and missing fields fall back to defaults
    pub fn load_settings(&self) -> Result<AppConfig> {
        self.load_settings_from(None)
    }

    /// Same as [`load_settings`](Self::load_settings), reading the overlay from
    /// `env` instead of the process environment when given.
    fn load_settings_from(&self, env: Option<config::Map<String, String>>) -> Result<AppConfig> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings = config::Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(config)
    }

    /// Save the settings file.
    ///
    /// # Arguments
    /// * `config` - The AppConfig to save
    pub fn save_settings(&self, config: &AppConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Resolve the fixture file named in `config` against the configuration directory.
    pub fn fixture_path(&self, config: &AppConfig) -> Utf8PathBuf {
        let file = Utf8Path::new(&config.fixture_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.config_dir.join(file)
        }
    }

    /// Load the fixture the simulated service serves.
    ///
    /// When the file does not exist, the default fixture is written there first
    /// so it can be edited.
    pub fn load_fixture(&self, path: &Utf8Path) -> Result<FixtureConfig> {
        if !path.exists() {
            tracing::warn!("Fixture file not found at {}, generating default", path);
            let fixture = default_fixture();
            self.save_fixture(path, &fixture)?;
            return Ok(fixture);
        }

        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {}", path))?;

        let fixture: FixtureConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse fixture: {}", path))?;

        tracing::info!(
            "Loaded fixture with {} profiles from {}",
            fixture.profiles.len(),
            path
        );
        Ok(fixture)
    }

    /// Save a fixture file.
    ///
    /// # Arguments
    /// * `path` - Where to write it
    /// * `fixture` - The FixtureConfig to save
    pub fn save_fixture(&self, path: &Utf8Path, fixture: &FixtureConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(fixture).context("Failed to serialize fixture to YAML")?;

        fs::write(path, yaml_string).with_context(|| format!("Failed to write fixture: {}", path))?;

        tracing::info!("Saved fixture to {}", path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

const DEFAULT_ACCOUNT: &str = "123456789012";
const THROTTLED_ACCOUNT: &str = "210987654321";
const DAY_MS: i64 = 86_400_000;

/// The fixture generated on first start.
///
/// - `default`: a few hundred resources behind a noticeable latency, enough to
///   watch the tables fill page by page
/// - `throttled`: fails part-way through listings and refuses role access
pub fn default_fixture() -> FixtureConfig {
    let mut profiles = IndexMap::new();
    profiles.insert("default".to_string(), populated_account(DEFAULT_ACCOUNT, 250));

    let mut throttled = populated_account(THROTTLED_ACCOUNT, 100);
    throttled.failures.insert(
        Operation::DescribeLogGroups,
        InjectedFailure {
            after_pages: 2,
            code: "ThrottlingException".to_string(),
            message: "Rate exceeded".to_string(),
            status: 400,
        },
    );
    throttled.failures.insert(
        Operation::ListRoles,
        InjectedFailure {
            after_pages: 0,
            code: "AccessDenied".to_string(),
            message: format!(
                "User: arn:aws:iam::{}:user/operator is not authorized to perform: iam:ListRoles",
                THROTTLED_ACCOUNT
            ),
            status: 403,
        },
    );
    throttled.failures.insert(
        Operation::GetMetricData,
        InjectedFailure {
            after_pages: 1,
            code: "ServiceUnavailable".to_string(),
            message: "Service is temporarily unavailable".to_string(),
            status: 503,
        },
    );
    profiles.insert("throttled".to_string(), throttled);

    FixtureConfig { profiles }
}

fn populated_account(account: &str, latency_ms: u64) -> FixtureAccount {
    let created = 1_650_000_000_000;

    let services = ["checkout", "payments", "inventory", "search", "notifications", "auth"];
    let mut log_groups = Vec::new();
    for (i, service) in services.iter().enumerate() {
        for stage in ["dev", "staging", "prod"] {
            for prefix in ["/aws/lambda", "/ecs", "/aws/apigateway"] {
                let name = format!("{}/{}-{}", prefix, service, stage);
                log_groups.push(LogGroup {
                    arn: format!("arn:aws:logs:us-east-1:{}:log-group:{}:*", account, name),
                    creation_time_ms: created + (log_groups.len() as i64) * DAY_MS,
                    stored_bytes: ((i + 1) * 1_048_576 * (log_groups.len() % 7 + 1)) as u64,
                    retention_days: (stage == "prod").then_some(90),
                    name,
                });
            }
        }
    }

    let mut roles = Vec::new();
    for service in services {
        for purpose in ["deployer", "runtime", "readonly", "ci"] {
            let name = format!("{}-{}", service, purpose);
            roles.push(Role {
                arn: format!("arn:aws:iam::{}:role/service-role/{}", account, name),
                create_date_ms: created + (roles.len() as i64) * DAY_MS / 2,
                description: Some(format!("{} role for {}", purpose, service)),
                name,
            });
        }
    }

    let mut metrics = Vec::new();
    for service in services {
        for name in ["Invocations", "Errors", "Duration", "Throttles"] {
            metrics.push(metric("AWS/Lambda", name, "FunctionName", service));
        }
        metrics.push(metric("AWS/SQS", "ApproximateNumberOfMessagesVisible", "QueueName", service));
        metrics.push(metric("Checkout", "OrdersPlaced", "Service", service));
        metrics.push(metric("Checkout", "CartValue", "Service", service));
    }
    for instance in ["i-0a1b2c3d", "i-0e4f5a6b", "i-0c7d8e9f"] {
        metrics.push(metric("AWS/EC2", "CPUUtilization", "InstanceId", instance));
        metrics.push(metric("AWS/EC2", "NetworkIn", "InstanceId", instance));
    }

    FixtureAccount {
        identity: CallerIdentity {
            account: account.to_string(),
            user_id: "AIDAEXAMPLEOPERATOR".to_string(),
            arn: format!("arn:aws:iam::{}:user/operator", account),
        },
        latency_ms,
        log_groups,
        roles,
        metrics,
        failures: IndexMap::new(),
    }
}

fn metric(namespace: &str, name: &str, dimension: &str, value: &str) -> Metric {
    Metric {
        namespace: namespace.to_string(),
        name: name.to_string(),
        dimensions: vec![Dimension {
            name: dimension.to_string(),
            value: value.to_string(),
        }],
    }
}
