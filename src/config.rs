use std::path::PathBuf;
use std::sync::LazyLock;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Environment variable holding the KIPRIS API service key.
pub const API_KEY_ENV: &str = "KIPRIS_API_KEY";

/// Environment variable holding the KIPRIS API base URL.
pub const BASE_URL_ENV: &str = "KIPRIS_API_BASE_URL";

/// Environment variable holding the register history service key for payment history lookups.
pub const HISTORY_API_KEY_ENV: &str = "PATENT_OFFICE_API_KEY";

/// Path to the user config file: `$HOME/.config/patent-fees.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Directory for query log files: `$HOME/logs/patent-fees`
pub static LOG_DIR: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join("logs").join(PROJECT_NAME))
});

/// Read a non-empty environment variable.
#[must_use]
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
