use std::{
    env,
    path::{
        Path,
        PathBuf,
    },
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use schematic::DEFAULT_DATA_VERSION;
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "schem.json";

/// Env var naming a settings file other than the default.
pub const SETTINGS_ENV: &'static str = "SCHEM_SETTINGS";

/// Env var overriding the settings' data version.
pub const DATA_VERSION_ENV: &'static str = "SCHEM_DATA_VERSION";


/// Tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Data version files are converted to and stamped with.
    pub data_version: i32,
    /// Author written into converted schematics which have none.
    pub default_author: Option<String>,
    /// Whether to decode written files again and compare them with what was
    /// written.
    pub compression_check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_version: DEFAULT_DATA_VERSION,
            default_author: None,
            compression_check: true,
        }
    }
}

impl Settings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self::try_read(path).unwrap_or_default()
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }

    /// Path of the settings file, from the environment or the default.
    pub fn path() -> PathBuf {
        env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME))
    }

    /// Read the settings file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        let mut settings = if path.exists() {
            Self::try_read(&path)
                .with_context(|| format!("invalid settings file {}", path.display()))?
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
            Self::default()
        };
        settings.apply_overrides(env::var(DATA_VERSION_ENV).ok().as_deref())?;
        Ok(settings)
    }

    fn apply_overrides(&mut self, data_version: Option<&str>) -> Result<()> {
        if let Some(data_version) = data_version {
            self.data_version = data_version.trim().parse()
                .with_context(|| format!("invalid {} {:?}", DATA_VERSION_ENV, data_version))?;
            debug!(data_version = self.data_version, "data version overridden from environment");
        }
        Ok(())
    }
}
