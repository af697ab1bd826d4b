use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extensions picked up when a directory is expanded, without the dot.
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// Number of leading PDF pages searched for a date.
    pub max_pages: usize,
    /// Extraction pool size; 0 means one worker per logical CPU.
    pub workers: usize,
    /// 0 disables the per-file timeout.
    pub extraction_timeout_secs: u64,
    /// 0 disables backup reuse.
    pub backup_reuse_window_secs: u64,
    pub case_insensitive_names: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
            ignore_patterns: Vec::new(),
            max_pages: 2,
            workers: 0,
            extraction_timeout_secs: 60,
            backup_reuse_window_secs: 3600,
            case_insensitive_names: cfg!(any(target_os = "windows", target_os = "macos")),
        }
    }
}

impl AppConfig {
    pub fn extraction_timeout(&self) -> Option<Duration> {
        match self.extraction_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn backup_reuse_window(&self) -> Option<Duration> {
        match self.backup_reuse_window_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// True when `file_name` carries one of the configured extensions.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        let Some((stem, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        !stem.is_empty()
            && self
                .extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Load `Config.toml` (optional) from the working directory, then overlay
/// `PDF_RENAMER_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("PDF_RENAMER")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extensions")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
