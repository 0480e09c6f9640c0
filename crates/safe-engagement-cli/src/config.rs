use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

type Migration = fn(&mut Map<String, Value>);

/// Step `i` upgrades a version-`i` document to version `i + 1`. The version
/// this build writes is the table's length.
const MIGRATIONS: &[Migration] = &[rename_delay_ms];

const CONFIG_VERSION: u32 = MIGRATIONS.len() as u32;

const DEFAULT_TYPING_DELAY_MS: u64 = 600;

/// Which renderer runs when no subcommand is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One prompt at a time, side dialogue included.
    #[default]
    Chat,
    /// Numbered questions with a progress line; side dialogue skipped.
    Form,
}

/// Presentation settings. Holds file locations and display preferences
/// only; answers are never written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 0 for files written before versioning.
    #[serde(default)]
    pub config_version: u32,
    /// JSON flow definition replacing the built-in flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_path: Option<PathBuf>,
    /// JSON tier list replacing the default tiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers_path: Option<PathBuf>,
    /// Pause before each chat message, in milliseconds.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
    #[serde(default)]
    pub default_mode: Mode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            flow_path: None,
            tiers_path: None,
            typing_delay_ms: DEFAULT_TYPING_DELAY_MS,
            default_mode: Mode::default(),
        }
    }
}

fn default_typing_delay_ms() -> u64 {
    DEFAULT_TYPING_DELAY_MS
}

/// `<config dir>/safe-engagement/config.json`.
pub fn default_config_path() -> eyre::Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("safe-engagement").join("config.json"))
        .ok_or_else(|| eyre::eyre!("could not determine the user config directory"))
}

/// Read the config at `path`, upgrading older layouts. A missing file is
/// not an error.
pub fn load_config(path: &Path) -> eyre::Result<AppConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(eyre::eyre!("cannot read config {}: {e}", path.display())),
    };

    let document: Value = serde_json::from_str(&raw)
        .map_err(|e| eyre::eyre!("config {} is not valid JSON: {e}", path.display()))?;
    let version = document
        .get("config_version")
        .and_then(Value::as_u64)
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));

    let upgraded = migrate(document, version)?;
    serde_json::from_value(upgraded)
        .map_err(|e| eyre::eyre!("config {} has an unexpected shape: {e}", path.display()))
}

/// Bring a raw config document from `from_version` to the current version.
///
/// Rejects documents written by a newer build rather than dropping fields
/// it does not know.
pub fn migrate(mut document: Value, from_version: u32) -> eyre::Result<Value> {
    if from_version > CONFIG_VERSION {
        return Err(eyre::eyre!(
            "config version {from_version} is newer than this build supports \
             (max {CONFIG_VERSION}); upgrade safe-engagement"
        ));
    }
    if from_version == CONFIG_VERSION {
        return Ok(document);
    }

    let fields = document
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config must be a JSON object"))?;
    for (step, upgrade) in MIGRATIONS.iter().enumerate().skip(from_version as usize) {
        upgrade(fields);
        tracing::info!(from = step, to = step + 1, "config upgraded");
    }
    fields.insert("config_version".to_string(), Value::from(CONFIG_VERSION));
    Ok(document)
}

/// v0 → v1: `delay_ms` became `typing_delay_ms`. An explicit new value wins.
fn rename_delay_ms(fields: &mut Map<String, Value>) {
    if let Some(delay) = fields.remove("delay_ms") {
        fields.entry("typing_delay_ms").or_insert(delay);
    }
}

/// Write `config` to `path` stamped with the current version. The file is
/// replaced in one rename and is readable by the owner only.
pub fn save_config(path: &Path, config: &AppConfig) -> eyre::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path {} has no parent directory", path.display()))?;
    std::fs::create_dir_all(parent)?;

    let current = AppConfig {
        config_version: CONFIG_VERSION,
        ..config.clone()
    };
    let body = serde_json::to_vec_pretty(&current)?;

    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, &body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))?;
    }
    std::fs::rename(&staging, path)?;

    tracing::info!(path = %path.display(), "config written");
    Ok(())
}
