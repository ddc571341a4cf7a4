/*
[INPUT]:  YAML configuration file and command-line overrides
[OUTPUT]: Resolved client / session settings
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use fused_auth::{
    ClaimValidator, ClientConfig, DEFAULT_BASE_URL, SignaturePolicy, TimeClaimPolicy,
    auth::DEFAULT_KEY_PREFIX,
};

/// On-disk configuration; every field may be omitted
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Service base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Application id tokens must be issued for
    #[serde(default)]
    pub app_id: Option<String>,
    /// Directory holding stored tokens
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    /// Storage key prefix
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Which time claim bounds a token
    #[serde(default)]
    pub time_claim: Option<TimeClaim>,
    /// Deadline for the long-polling login request
    #[serde(default)]
    pub login_timeout_secs: Option<u64>,
    /// Shared HMAC secret; enables signature verification when set
    #[serde(default)]
    pub hs256_secret: Option<String>,
}

/// Serializable mirror of [`TimeClaimPolicy`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeClaim {
    #[default]
    Expiry,
    IssuedAtFuture,
    Ignore,
}

impl From<TimeClaim> for TimeClaimPolicy {
    fn from(value: TimeClaim) -> Self {
        match value {
            TimeClaim::Expiry => TimeClaimPolicy::Expiry,
            TimeClaim::IssuedAtFuture => TimeClaimPolicy::IssuedAtFuture,
            TimeClaim::Ignore => TimeClaimPolicy::Ignore,
        }
    }
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty file parses as YAML null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).context("parse config")?;
        Ok(config)
    }

    /// Fill every field set in `overrides`, keeping the rest
    pub fn merge(mut self, overrides: CliConfig) -> Self {
        self.base_url = overrides.base_url.or(self.base_url);
        self.app_id = overrides.app_id.or(self.app_id);
        self.store_dir = overrides.store_dir.or(self.store_dir);
        self.key_prefix = overrides.key_prefix.or(self.key_prefix);
        self.time_claim = overrides.time_claim.or(self.time_claim);
        self.login_timeout_secs = overrides.login_timeout_secs.or(self.login_timeout_secs);
        self.hs256_secret = overrides.hs256_secret.or(self.hs256_secret);
        self
    }

    /// Apply defaults and check what is required
    pub fn resolve(self) -> Result<Settings> {
        let app_id = self
            .app_id
            .ok_or_else(|| anyhow!("app id is required (--app-id or `app_id` in config)"))?;

        let store_dir = match self.store_dir {
            Some(dir) => dir,
            None => default_store_dir()?,
        };

        let mut client = ClientConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ..ClientConfig::default()
        };
        if let Some(secs) = self.login_timeout_secs {
            if secs == 0 {
                return Err(anyhow!("login_timeout_secs must be positive"));
            }
            client.login_timeout = Duration::from_secs(secs);
        }

        let signature_policy = match self.hs256_secret {
            Some(secret) if !secret.is_empty() => SignaturePolicy::hs256(secret),
            _ => SignaturePolicy::Unverified,
        };

        Ok(Settings {
            app_id,
            store_dir,
            key_prefix: self
                .key_prefix
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            client,
            validator: ClaimValidator::new(self.time_claim.unwrap_or_default().into()),
            signature_policy,
        })
    }
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_id: String,
    pub store_dir: PathBuf,
    pub key_prefix: String,
    pub client: ClientConfig,
    pub validator: ClaimValidator,
    pub signature_policy: SignaturePolicy,
}

/// `<data dir>/fused-auth`
pub fn default_store_dir() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("fused-auth"))
}
