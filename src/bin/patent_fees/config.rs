use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use patent_fees::config::{API_KEY_ENV, BASE_URL_ENV, HISTORY_API_KEY_ENV, env_value};
use patent_fees::patent::CustomerNumber;
use patent_fees::print_error;
use patent_fees::registry::REGISTER_HISTORY_URL;

use crate::PatentFeesArgs;

/// Final config combined from CLI arguments, environment and user config file.
pub struct Config {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) output_dir: PathBuf,
    /// Fixed evaluation date, or `None` to use the current date.
    pub(crate) evaluation_date: Option<NaiveDate>,
    pub(crate) customer_numbers: Vec<CustomerNumber>,
    /// Payment history lookups are disabled without a key.
    pub(crate) history_api_key: Option<String>,
    pub(crate) history_url: String,
    pub(crate) verbose: bool,
}

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct PatentFeesConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    history_api_key: Option<String>,
    #[serde(default)]
    history_url: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    patent_fees: PatentFeesConfig,
}

/// Registry access values from environment variables.
#[derive(Debug, Default)]
struct EnvConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    history_api_key: Option<String>,
}

impl PatentFeesConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    fn get_user_config() -> Self {
        patent_fees::config::CONFIG_PATH
            .as_deref()
            .filter(|path| path.exists())
            .and_then(|path| {
                fs::read_to_string(path)
                    .map_err(|e| {
                        print_error!("Error reading config file {}: {e}", path.display());
                    })
                    .ok()
            })
            .and_then(|config_string| {
                Self::from_toml_str(&config_string)
                    .map_err(|e| {
                        print_error!("{e}");
                    })
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.patent_fees)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl EnvConfig {
    fn from_env() -> Self {
        Self {
            api_key: env_value(API_KEY_ENV),
            base_url: env_value(BASE_URL_ENV),
            history_api_key: env_value(HISTORY_API_KEY_ENV),
        }
    }
}

impl Config {
    /// Create config from given command line args, environment and user config file.
    ///
    /// # Errors
    /// Returns an error if the API key or base URL is missing,
    /// or the output directory cannot be created.
    pub fn from_args(args: PatentFeesArgs) -> Result<Self> {
        Self::from_parts(args, EnvConfig::from_env(), PatentFeesConfig::get_user_config())
    }

    fn from_parts(args: PatentFeesArgs, env: EnvConfig, user_config: PatentFeesConfig) -> Result<Self> {
        let api_key = env
            .api_key
            .or_else(|| non_empty(user_config.api_key))
            .with_context(|| format!("API key is not set. Set {API_KEY_ENV} or api_key in the config file"))?;

        let base_url = env
            .base_url
            .or_else(|| non_empty(user_config.base_url))
            .with_context(|| format!("API base URL is not set. Set {BASE_URL_ENV} or base_url in the config file"))?;

        let history_api_key = env.history_api_key.or_else(|| non_empty(user_config.history_api_key));
        let history_url = non_empty(user_config.history_url).unwrap_or_else(|| REGISTER_HISTORY_URL.to_string());

        let output = args.output.or(user_config.output);
        let output_dir = patent_fees::resolve_output_dir(output.as_deref())?;

        Ok(Self {
            api_key,
            base_url,
            output_dir,
            evaluation_date: args.date,
            customer_numbers: args.customer_numbers,
            history_api_key,
            history_url,
            verbose: args.verbose || user_config.verbose,
        })
    }

    /// Date used for renewal fee calculation.
    pub fn today(&self) -> NaiveDate {
        self.evaluation_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
