//! Logger settings layered from a file and `LOGKIT__*` environment variables.

use crate::error::{LoggerError, LoggerErrorExt};
use crate::format::LogFormat;
use crate::private::Sealed;
use crate::{DEFAULT_FOLDER, Logger, LoggerBuilder, WithName};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Settings file looked up (with any supported extension) when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "logkit";
/// Prefix of environment overrides, e.g. `LOGKIT__LEVEL=info`.
pub const ENV_PREFIX: &str = "LOGKIT";

/// Serializable logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerSettings {
    pub name: String,
    pub level: String,
    pub console: bool,
    pub console_ansi: bool,
    pub file_logging: bool,
    pub folder: PathBuf,
    pub max_files: Option<usize>,
    pub format: String,
    pub env_filter: Option<String>,
    pub relative_paths: bool,
    pub file_ansi: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            name: "application".to_owned(),
            level: "debug".to_owned(),
            console: true,
            console_ansi: true,
            file_logging: false,
            folder: PathBuf::from(DEFAULT_FOLDER),
            max_files: None,
            format: LogFormat::default().name().to_owned(),
            env_filter: None,
            relative_paths: true,
            file_ansi: false,
        }
    }
}

impl LoggerSettings {
    /// Parses [`LoggerSettings::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for unknown level names.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        parse_level(&self.level)
    }

    /// Parses [`LoggerSettings::format`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for unknown format names.
    pub fn log_format(&self) -> Result<LogFormat, LoggerError> {
        self.format.parse()
    }

    /// Builds a logger without installing it globally.
    ///
    /// # Errors
    /// See [`LoggerBuilder::build`].
    pub fn build(&self) -> Result<Logger, LoggerError> {
        self.assemble(false)
    }

    /// Builds a logger and installs it as the process-wide default.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`].
    pub fn init(&self) -> Result<Logger, LoggerError> {
        self.assemble(true)
    }

    fn assemble(&self, install: bool) -> Result<Logger, LoggerError> {
        let builder = Logger::builder().name(self.name.clone());

        if self.file_logging {
            let mut builder = self.configure(builder.path(&self.folder))?.file_ansi(self.file_ansi);
            if let Some(max_files) = self.max_files {
                builder = builder.max_files(max_files);
            }
            finish(builder, install)
        } else {
            finish(self.configure(builder)?, install)
        }
    }

    fn configure<F: Sealed>(
        &self,
        builder: LoggerBuilder<WithName, F>,
    ) -> Result<LoggerBuilder<WithName, F>, LoggerError> {
        let mut builder = builder
            .level(self.level_filter()?)
            .format(self.log_format()?)
            .console(self.console)
            .console_ansi(self.console_ansi)
            .relative_paths(self.relative_paths);
        if let Some(filter) = &self.env_filter {
            builder = builder.env_filter(filter.clone());
        }
        Ok(builder)
    }
}

fn finish<F: Sealed>(
    builder: LoggerBuilder<WithName, F>,
    install: bool,
) -> Result<Logger, LoggerError> {
    if install { builder.init() } else { builder.build() }
}

/// Parses a level name. Accepts `warning` and `critical` alongside tracing's names.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] on empty or unknown values.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    let normalized = level.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "" => Err(LoggerError::invalid("Log level must not be empty")),
        "warning" => Ok(LevelFilter::WARN),
        "critical" => Ok(LevelFilter::ERROR),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| LoggerError::invalid(format!("Unrecognised log level: '{level}'"))),
    }
}

/// Loads settings from `path` (required) or the optional default file, then applies
/// `LOGKIT__*` environment overrides.
///
/// # Errors
/// Returns [`LoggerError::Settings`] if a required file is missing, a value has the
/// wrong type, or an unknown key is present.
///
/// # Example
/// ```rust,no_run
/// use logkit_logger::load_settings;
///
/// let settings = load_settings(Some("config/logging.toml"))?;
/// let _logger = settings.init()?;
/// # Ok::<(), logkit_logger::LoggerError>(())
/// ```
pub fn load_settings(path: Option<impl AsRef<Path>>) -> Result<LoggerSettings, LoggerError> {
    load_settings_with_env(path, None)
}

/// Same as [`load_settings`], reading overrides from `env` instead of the process
/// environment when given.
///
/// # Errors
/// See [`load_settings`].
pub fn load_settings_with_env(
    path: Option<impl AsRef<Path>>,
    env: Option<Map<String, String>>,
) -> Result<LoggerSettings, LoggerError> {
    let (source, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    tracing::debug!(path = %source.display(), required, "Loading logger settings");

    let settings = Config::builder()
        .add_source(File::from(source.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true).source(env),
        )
        .build()
        .context("Failed to build logger settings")?
        .try_deserialize::<LoggerSettings>()
        .context("Failed to deserialize logger settings")?;

    Ok(settings)
}
