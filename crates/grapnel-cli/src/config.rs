//! Service settings loaded from a YAML file with environment
//! overrides layered on top, so containers can run without a file at
//! all.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::cli::{CliError, CliResult};

/// File name probed in each configuration directory.
pub(crate) const CONFIG_FILE_NAME: &str = "grapnel.yaml";

const SYSTEM_CONFIG_DIR: &str = "/etc/grapnel";

const ENV_BASE_URL: &str = "GRAPNEL_BASE_URL";
const ENV_CUSTOMER_ID: &str = "GRAPNEL_CUSTOMER_ID";
const ENV_PIN: &str = "GRAPNEL_PIN";

/// Resolved settings used to build the remote client.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// Root URL of the hosting service.
    pub(crate) base_url: Url,
    /// Account identifier sent with every request.
    pub(crate) customer_id: String,
    /// Account pin sent with every request.
    pub(crate) pin: String,
}

/// On-disk shape of `grapnel.yaml`. Every field is optional so the
/// environment can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    customer_id: Option<String>,
    pin: Option<String>,
}

#[derive(Debug, Default)]
struct EnvOverrides {
    base_url: Option<String>,
    customer_id: Option<String>,
    pin: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            base_url: env::var(ENV_BASE_URL).ok(),
            customer_id: env::var(ENV_CUSTOMER_ID).ok(),
            pin: env::var(ENV_PIN).ok(),
        }
    }
}

/// Load settings from `explicit` or from the first file on the search
/// path, then apply environment overrides.
pub(crate) fn load(explicit: Option<&Path>) -> CliResult<Settings> {
    let file = match explicit {
        Some(path) => read_file(path)?,
        None => match first_config_file() {
            Some(path) => read_file(&path)?,
            None => FileSettings::default(),
        },
    };
    resolve(file, EnvOverrides::from_env())
}

/// Candidate locations in probe order: system, per-user, working
/// directory.
fn search_path() -> Vec<PathBuf> {
    let mut candidates = vec![Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)];
    if let Some(base) = dirs::config_dir() {
        candidates.push(base.join("grapnel").join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    candidates
}

fn first_config_file() -> Option<PathBuf> {
    search_path()
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn read_file(path: &Path) -> CliResult<FileSettings> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        CliError::validation(format!(
            "could not read config file {}: {err}",
            path.display()
        ))
    })?;
    serde_yaml::from_str(&contents).map_err(|err| {
        CliError::validation(format!("invalid config file {}: {err}", path.display()))
    })
}

fn resolve(file: FileSettings, env: EnvOverrides) -> CliResult<Settings> {
    let base_url = present(env.base_url.or(file.base_url));
    let customer_id = present(env.customer_id.or(file.customer_id));
    let pin = present(env.pin.or(file.pin));

    let mut missing = Vec::new();
    if base_url.is_none() {
        missing.push("base_url");
    }
    if customer_id.is_none() {
        missing.push("customer_id");
    }
    if pin.is_none() {
        missing.push("pin");
    }

    let (Some(base_url), Some(customer_id), Some(pin)) = (base_url, customer_id, pin) else {
        return Err(CliError::validation(format!(
            "missing configuration: {}",
            missing.join(", ")
        )));
    };

    let base_url = Url::parse(&base_url)
        .map_err(|err| CliError::validation(format!("invalid base_url '{base_url}': {err}")))?;
    Ok(Settings {
        base_url,
        customer_id,
        pin,
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
