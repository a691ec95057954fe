use anyhow::{bail, Context};
use lotto_core::LotteryConfig;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const DATABASE_FILE: &str = "lotto.db";
pub const LOCK_FILE: &str = "lotto.lock";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub lottery: LotteryConfig,
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lotto")
}

impl CliConfig {
    /// Reads `config.json` from the data directory, falling back to defaults
    /// when the file is absent. Missing fields take their default values.
    pub async fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);

        let lottery = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<LotteryConfig>(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LotteryConfig::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        lottery.validate()?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            lottery,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

/// Exclusive claim on a data directory, released on drop. Saves rewrite
/// whole snapshots, so only one process may use a directory at a time.
#[derive(Debug)]
pub struct DataDirLock {
    path: PathBuf,
}

impl DataDirLock {
    pub fn acquire(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(LOCK_FILE);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let lock = Self { path };
                writeln!(file, "{}", std::process::id())?;
                Ok(lock)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let owner = std::fs::read_to_string(&path).unwrap_or_default();
                bail!(
                    "Data directory {} is in use by another lotto process (pid {}). \
                     Remove {} if that process is no longer running.",
                    data_dir.display(),
                    owner.trim(),
                    path.display()
                )
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
        }
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}
