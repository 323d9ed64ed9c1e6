use std::path::PathBuf;

use crate::state::Theme;

pub const THEME_VAR: &str = "XG_THEME";
pub const EXPORT_DIR_VAR: &str = "XG_EXPORT_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub theme: Theme,
    pub export_dir: PathBuf,
    /// Fallbacks taken while reading the environment; replayed into the console log.
    pub warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            export_dir: PathBuf::from("."),
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Reads `.env.local` then `.env` (missing files are fine), then the environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(THEME_VAR) {
            match Theme::parse(&raw) {
                Some(theme) => cfg.theme = theme,
                None => cfg.warnings.push(format!(
                    "[WARN] {THEME_VAR}={raw:?} not recognised, using {}",
                    cfg.theme.label()
                )),
            }
        }

        if let Some(raw) = lookup(EXPORT_DIR_VAR) {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                cfg.warnings
                    .push(format!("[WARN] {EXPORT_DIR_VAR} is blank, exporting to ."));
            } else {
                cfg.export_dir = PathBuf::from(trimmed);
            }
        }

        cfg
    }
}
