//! Configuration file support.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::convert::{ConvertOptions, DEFAULT_PARAGRAPH_LIMIT, MAX_BATCH_SIZE, PlanOptions};
use crate::domain::LanguageMap;
use crate::remote::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const TOKEN_ENV: &str = "LARKMD_ACCESS_TOKEN";
pub const BASE_URL_ENV: &str = "LARKMD_BASE_URL";

/// Application configuration loaded from config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API host
    pub base_url: String,

    /// Bearer token for the docx API
    pub access_token: Option<String>,

    /// Blocks per creation call (at most 50)
    pub batch_size: usize,

    /// Character ceiling for a single text block
    pub paragraph_limit: usize,

    /// Page size when listing document blocks
    pub page_size: usize,

    /// Extra or overriding fence tag → language code entries
    pub languages: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            batch_size: MAX_BATCH_SIZE,
            paragraph_limit: DEFAULT_PARAGRAPH_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            languages: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Parses and validates TOML config text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.batch_size > MAX_BATCH_SIZE {
            log::warn!(
                "batch_size {} exceeds the vendor cap, using {}",
                self.batch_size,
                MAX_BATCH_SIZE
            );
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            log::warn!("page_size {} clamped to 1..={}", self.page_size, MAX_PAGE_SIZE);
        }
        Ok(())
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/larkmd/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("larkmd")
            .join("config.toml")
    }

    /// Applies environment variables, then CLI flags.
    ///
    /// Precedence order:
    /// 1. CLI `--token` / `--base-url`
    /// 2. `LARKMD_ACCESS_TOKEN` / `LARKMD_BASE_URL`
    /// 3. Config file
    pub fn with_overrides(
        self,
        env: impl Fn(&str) -> Option<String>,
        cli_token: Option<&str>,
        cli_base_url: Option<&str>,
    ) -> Self {
        let access_token = cli_token
            .map(str::to_string)
            .or_else(|| env(TOKEN_ENV))
            .or(self.access_token);
        let base_url = cli_base_url
            .map(str::to_string)
            .or_else(|| env(BASE_URL_ENV))
            .unwrap_or(self.base_url);
        Self {
            access_token,
            base_url,
            ..self
        }
    }

    pub fn language_map(&self) -> LanguageMap {
        LanguageMap::vendor_default().with_overrides(&self.languages)
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            paragraph_limit: self.paragraph_limit,
            languages: self.language_map(),
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions::new(self.batch_size)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            access_token: self.access_token.clone(),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            ..ClientSettings::default()
        }
    }
}
