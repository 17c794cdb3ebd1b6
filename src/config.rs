use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const USER_AGENT: &str = "macrodex";

const DEFAULT_INDEX_URL: &str =
    "https://github.com/LousyBook-01/ReplayEngine-Macros-GD/raw/refs/heads/master/indexes.json";
const DEFAULT_MACRO_BASE_URL: &str =
    "https://github.com/LousyBook-01/ReplayEngine-Macros-GD/raw/refs/heads/master/Macros/";
const DEFAULT_MACRO_EXTENSION: &str = "re";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source_dir: PathBuf,
    pub work_dir: PathBuf,
    pub index_path: PathBuf,
    pub cache_dir: PathBuf,
    pub download_dir: PathBuf,
    #[serde(default = "default_index_url")]
    pub index_url: String,
    #[serde(default = "default_macro_base_url")]
    pub macro_base_url: String,
    #[serde(default = "default_macro_extension")]
    pub macro_extension: String,
}

impl AppConfig {
    pub fn load_or_create() -> Result<Self> {
        let base_dir = base_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read app config")?;
            let config: AppConfig = serde_json::from_str(&raw).context("parse app config")?;
            return Ok(config);
        }

        let game_macros = game_macros_dir().unwrap_or_default();
        let config = AppConfig {
            source_dir: game_macros.clone(),
            work_dir: PathBuf::from("Macros"),
            index_path: PathBuf::from("indexes.json"),
            cache_dir: PathBuf::from("cache"),
            download_dir: game_macros,
            index_url: default_index_url(),
            macro_base_url: default_macro_base_url(),
            macro_extension: default_macro_extension(),
        };
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let base_dir = base_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        let raw = serde_json::to_string_pretty(self).context("serialize app config")?;
        fs::write(path, raw).context("write app config")?;
        Ok(())
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join("indexes.json")
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(base_data_dir()?.join("macrodex.log"))
    }
}

// The ReplayEngine mod's macro folder under the local game install.
fn game_macros_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(
        base.data_local_dir()
            .join("GeometryDash")
            .join("geode")
            .join("mods")
            .join("tobyadd.gdh")
            .join("Macros"),
    )
}

fn base_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("macrodex"))
}

fn default_index_url() -> String {
    DEFAULT_INDEX_URL.to_string()
}

fn default_macro_base_url() -> String {
    DEFAULT_MACRO_BASE_URL.to_string()
}

fn default_macro_extension() -> String {
    DEFAULT_MACRO_EXTENSION.to_string()
}
