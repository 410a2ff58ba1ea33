use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub struct Config {
    git_path: String,
}

#[derive(Deserialize, Serialize, Default)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_path: Option<String>,
}

/// Environment overrides, read from `GIT_THESEUS_*` variables.
#[derive(Deserialize, Default, Debug)]
pub(crate) struct EnvConfig {
    #[serde(default)]
    pub git_path: Option<String>,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Initialize the global configuration exactly once.
    /// Safe to call multiple times; subsequent calls are no-ops.
    pub fn init() {
        let _ = CONFIG.get_or_init(build_config);
    }

    /// Access the global configuration. Lazily initializes if not already initialized.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(build_config)
    }

    /// Returns the command to invoke git.
    pub fn git_cmd(&self) -> &str {
        &self.git_path
    }
}

fn build_config() -> Config {
    let file_cfg = load_file_config();
    let env_cfg = load_env_config();
    Config {
        git_path: resolve_git_path(&env_cfg, &file_cfg),
    }
}

fn load_env_config() -> EnvConfig {
    envy::prefixed("GIT_THESEUS_")
        .from_env::<EnvConfig>()
        .unwrap_or_else(|e| {
            eprintln!("Warning: ignoring invalid GIT_THESEUS_* environment: {}", e);
            EnvConfig::default()
        })
}

fn resolve_git_path(env_cfg: &EnvConfig, file_cfg: &Option<FileConfig>) -> String {
    // 1) Environment override
    if let Some(path) = env_cfg.git_path.as_deref().map(str::trim)
        && !path.is_empty()
    {
        return path.to_string();
    }

    // 2) From config file
    if let Some(path) = file_cfg
        .as_ref()
        .and_then(|cfg| cfg.git_path.as_deref())
        .map(str::trim)
        && !path.is_empty()
        && is_executable(Path::new(path))
    {
        return path.to_string();
    }

    // 3) Probe common locations across platforms
    let candidates: &[&str] = &[
        "/opt/homebrew/bin/git",
        "/usr/local/bin/git",
        "/usr/bin/git",
        "/bin/git",
        r"C:\\Program Files\\Git\\bin\\git.exe",
        r"C:\\Program Files (x86)\\Git\\bin\\git.exe",
    ];

    if let Some(found) = candidates.iter().map(Path::new).find(|p| is_executable(p)) {
        return found.to_string_lossy().to_string();
    }

    // 4) Leave it to PATH lookup
    "git".to_string()
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_file_path()?;
    let data = fs::read(&path).ok()?;
    serde_json::from_slice::<FileConfig>(&data).ok()
}

fn config_file_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".git-theseus").join("config.json"))
}

fn is_executable(path: &Path) -> bool {
    // Existence is enough here; the OS enforces exec permissions on spawn.
    path.exists() && path.is_file()
}
