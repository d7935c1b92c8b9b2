use crate::infra::DEFAULT_BINARY;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config_version: u32,
    pub binary: String,
    pub notice_duration_ms: u64,
    pub theme: String,
    pub show_icons: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            binary: DEFAULT_BINARY.to_string(),
            notice_duration_ms: 2000,
            theme: "default".to_string(),
            show_icons: true,
        }
    }
}

impl AppConfig {
    pub fn load_or_default() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let parsed = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        if parsed.config_version != CONFIG_VERSION {
            anyhow::bail!(
                "unsupported config_version {} in {} (expected {CONFIG_VERSION})",
                parsed.config_version,
                path.display()
            );
        }

        Ok(parsed)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not resolve config directory")?;
    Ok(base.join("chez-tui").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.config_version, 1);
        assert_eq!(cfg.binary, "chezmoi");
        assert_eq!(cfg.notice_duration(), Duration::from_secs(2));
        assert!(cfg.show_icons);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let raw = r#"
theme = "mono"
notice_duration_ms = 3500
"#;

        let cfg = toml::from_str::<AppConfig>(raw).expect("parse partial config");
        assert_eq!(cfg.theme, "mono");
        assert_eq!(cfg.notice_duration_ms, 3500);
        assert_eq!(cfg.binary, "chezmoi");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = AppConfig::load_from(&dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg.notice_duration_ms, 2000);
    }

    #[test]
    fn unknown_config_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "config_version = 2\ntheme = \"mono\"\n").expect("write");

        let err = AppConfig::load_from(&path).expect_err("version mismatch");
        assert!(err.to_string().contains("unsupported config_version 2"));

        fs::write(&path, "config_version = 1\ntheme = \"mono\"\n").expect("write");
        let cfg = AppConfig::load_from(&path).expect("current version loads");
        assert_eq!(cfg.theme, "mono");
    }

    #[test]
    fn malformed_file_is_an_error_naming_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = [").expect("write");
        let err = AppConfig::load_from(&path).expect_err("parse fails");
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
