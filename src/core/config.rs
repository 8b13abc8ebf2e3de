use crate::core::currency::CurrencyCode;
use crate::core::gate::AlertPolicy;
use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_CRON: &str = "0 */15 6-20 * * Mon-Fri";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}

fn default_cron() -> String {
    DEFAULT_CRON.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub access_key: String,
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PairConfig {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            cron: default_cron(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Checks applied to the rate API response before the rate is extracted.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidationConfig {
    /// Require the response `base` to equal the configured from-currency.
    /// When false only the presence of `base` is checked.
    #[serde(default = "default_true")]
    pub match_base: bool,
    /// Key that must be present in `rates`. Defaults to the configured to-currency.
    pub required_rate: Option<CurrencyCode>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            match_base: true,
            required_rate: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub pair: PairConfig,
    pub alert: AlertPolicy,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Checks everything serde cannot. Currency codes are already validated on parse.
    pub fn validate(&self) -> Result<()> {
        if self.api.access_key.trim().is_empty() {
            bail!("api.access_key must not be empty");
        }
        reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        let alert = &self.alert;
        if !alert.email_threshold.is_finite() {
            bail!("alert.email_threshold must be a finite number");
        }
        if !alert.min_delta_to_renotify.is_finite() || alert.min_delta_to_renotify < 0.0 {
            bail!("alert.min_delta_to_renotify must be a non-negative number");
        }

        cron::Schedule::from_str(&crate::scheduler::normalize_cron(&self.schedule.cron))
            .map_err(|e| anyhow!("schedule.cron is invalid: {e}"))?;

        if self.email.smtp_host.trim().is_empty() {
            bail!("email.smtp_host must not be empty");
        }
        for (field, address) in [("email.from", &self.email.from), ("email.to", &self.email.to)] {
            address
                .parse::<lettre::message::Mailbox>()
                .map_err(|e| anyhow!("{field} is not a valid address '{address}': {e}"))?;
        }
        Ok(())
    }

    /// The rate key the response must carry.
    pub fn required_rate(&self) -> &CurrencyCode {
        self.validation
            .required_rate
            .as_ref()
            .unwrap_or(&self.pair.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
api:
  access_key: "secret"
  base_url: "https://bankersalgo.com/apirates2/"
pair:
  from: "USD"
  to: "INR"
alert:
  email_threshold: 80.0
email:
  smtp_host: "smtp.example.com"
  from: "alerts@example.com"
  to: "me@example.com"
"#;

    #[test]
    fn test_config_deserialization_with_defaults() {
        let config: AppConfig = serde_yaml::from_str(MINIMAL).expect("Failed to deserialize");
        config.validate().unwrap();

        assert_eq!(config.api.access_key, "secret");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.pair.from.as_str(), "USD");
        assert_eq!(config.pair.to.as_str(), "INR");
        assert_eq!(config.alert.email_threshold, 80.0);
        assert_eq!(config.alert.max_emails_per_day, 5);
        assert_eq!(config.alert.min_delta_to_renotify, 0.20);
        assert_eq!(config.schedule.cron, DEFAULT_CRON);
        assert_eq!(config.email.smtp_port, 587);
        assert!(config.email.tls);
        assert!(config.validation.match_base);
        assert_eq!(config.required_rate().as_str(), "INR");
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let yaml_str = r#"
api:
  access_key: "secret"
  base_url: "http://localhost:8080/rates/"
  timeout_secs: 3
pair:
  from: "eur"
  to: "gbp"
alert:
  email_threshold: 0.85
  max_emails_per_day: 2
  min_delta_to_renotify: 0.01
schedule:
  cron: "*/10 * * * * *"
email:
  smtp_host: "localhost"
  smtp_port: 2525
  tls: false
  from: "Alerts <alerts@example.com>"
  to: "me@example.com"
validation:
  match_base: false
  required_rate: "INR"
data_path: "/tmp/ratewatch"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        config.validate().unwrap();

        assert_eq!(config.api.timeout(), Duration::from_secs(3));
        assert_eq!(config.pair.from.as_str(), "EUR");
        assert_eq!(config.alert.max_emails_per_day, 2);
        assert_eq!(config.schedule.cron, "*/10 * * * * *");
        assert!(!config.email.tls);
        assert!(!config.validation.match_base);
        assert_eq!(config.required_rate().as_str(), "INR");
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/ratewatch")
        );
    }

    #[test]
    fn test_unknown_currency_fails_to_parse() {
        let yaml_str = MINIMAL.replace("\"INR\"", "\"XXZ\"");
        let result = serde_yaml::from_str::<AppConfig>(&yaml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();

        let mut config = base.clone();
        config.api.access_key = " ".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("access_key"));

        let mut config = base.clone();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("base_url"));

        let mut config = base.clone();
        config.alert.min_delta_to_renotify = -0.1;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("min_delta_to_renotify")
        );

        let mut config = base.clone();
        config.schedule.cron = "every tuesday".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("schedule.cron"));

        let mut config = base;
        config.email.to = "not-an-email".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("email.to"));
    }

    #[test]
    fn test_load_from_path_validates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");

        fs::write(&path, MINIMAL)?;
        assert!(AppConfig::load_from_path(&path).is_ok());

        fs::write(&path, MINIMAL.replace("\"secret\"", "\"\""))?;
        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("access_key"));
        Ok(())
    }
}
