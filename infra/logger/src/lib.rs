//! # Logger
//!
//! A named application logger built on `tracing`.
//!
//! * Console output to `stderr`, one coloured line per record:
//!   `[2024-05-01 17:05:32,000] | ~/src/main.rs:12 | INFO | Hello, world!`
//! * Optional file output to `logs/<YYYY-MM-DD>-<name>.log`, switching files when
//!   the date changes and written through a non-blocking worker.
//! * Source paths under the working directory are shortened to `~`.
//! * The line layout ([`LogFormat`]) can be switched at runtime for all sinks.
//! * Use [`LoggerBuilder::env_filter`] to set module-directed filters
//!   (e.g., `"myapp=debug,hyper=info"`), in addition to `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust
//! # use logkit_logger::{Logger, LevelFilter};
//!
//! let logger = Logger::builder()
//!     .name("application")
//!     .level(LevelFilter::DEBUG)
//!     .build()
//!     .unwrap();
//!
//! logger.info("Hello, world!");
//! ```

mod daily;
mod error;
mod format;
mod palette;
mod paths;
mod settings;

pub use crate::daily::{DailyFile, file_name};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::format::LogFormat;
pub use crate::palette::{RESET, Severity};
pub use crate::paths::PathRewriter;
pub use crate::settings::{
    DEFAULT_SETTINGS_FILE, ENV_PREFIX, LoggerSettings, load_settings, load_settings_with_env,
    parse_level,
};
pub use tracing::level_filters::LevelFilter;

use crate::format::{EventFormatter, FormatHandle};
use private::Sealed;
use std::fmt::Display;
use std::panic::Location;
use std::path::PathBuf;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Folder used by [`LoggerBuilder::file_logging`].
pub const DEFAULT_FOLDER: &str = "logs";

#[derive(Debug)]
pub struct LoggerConfig {
    console: bool,
    console_ansi: bool,
    console_writer: Option<BoxMakeWriter>,
    level: LevelFilter,
    env_filter: Option<String>,
    format: LogFormat,
    relative_paths: bool,
    path_root: Option<PathBuf>,
    folder: Option<PathBuf>,
    max_files: Option<usize>,
    file_ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            console_ansi: true,
            console_writer: None,
            level: LevelFilter::DEBUG,
            env_filter: None,
            format: LogFormat::Standard,
            relative_paths: true,
            path_root: None,
            folder: None,
            max_files: None,
            file_ansi: false,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// A builder for configuring a [`Logger`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file_state: std::marker::PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Sets the name of the logger. Also used as the log file stem.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder {
            name: WithName(name.into()),
            config: self.config,
            file_state: std::marker::PhantomData,
        }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Keeps only the newest `max` daily files for this logger.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = Some(max);
        self
    }

    /// Enables colour escapes in the log file (off by default).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn file_ansi(mut self, enabled: bool) -> Self {
        self.config.file_ansi = enabled;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    /// Configures the minimum log level to be emitted. Defaults to `DEBUG`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds an explicit env filter (e.g., `myapp=debug,hyper=info`).
    ///
    /// Without it, `RUST_LOG` is read with [`LoggerBuilder::level`] as the default directive.
    /// Invalid filters cause [`LoggerBuilder::build`] to return an error.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Enables console logging.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Enables colour escapes on the console (on by default).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console_ansi(mut self, enabled: bool) -> Self {
        self.config.console_ansi = enabled;
        self
    }

    /// Redirects console output, which goes to `stderr` by default.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn console_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        self.config.console_writer = Some(BoxMakeWriter::new(writer));
        self
    }

    /// Selects the initial line layout.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Toggles shortening of source paths under the working directory to `~`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn relative_paths(mut self, enabled: bool) -> Self {
        self.config.relative_paths = enabled;
        self
    }

    /// Shortens paths under `root` instead of the working directory.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.path_root = Some(root.into());
        self
    }

    /// Enables file logging in the default `logs` folder.
    pub fn file_logging(self) -> LoggerBuilder<WithName, WithFile> {
        self.path(DEFAULT_FOLDER)
    }

    /// Enables file logging in `folder`.
    pub fn path(self, folder: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.folder = Some(folder.into());
        LoggerBuilder { config, name: self.name, file_state: std::marker::PhantomData }
    }

    /// Consumes the builder and creates the logger without installing it globally.
    ///
    /// Use [`Logger::in_scope`] or the record methods to log through it.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid builder settings.
    /// Returns [`LoggerError::Io`] if the log folder or file cannot be created.
    pub fn build(self) -> Result<Logger, LoggerError> {
        let LoggerBuilder { config, name: WithName(name), .. } = self;
        validate_config(&config, &name)?;

        let env_filter = build_env_filter(&config)?;
        let paths = if !config.relative_paths {
            PathRewriter::disabled()
        } else if let Some(root) = config.path_root {
            PathRewriter::new(root)
        } else {
            PathRewriter::from_current_dir()
        };
        let format = FormatHandle::new(config.format);
        let formatter = EventFormatter::new(&name, format.clone(), paths);

        let mut layers = Vec::new();

        if config.console {
            let writer =
                config.console_writer.unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));
            layers.push(
                layer()
                    .event_format(formatter.clone())
                    .with_writer(writer)
                    .with_ansi(config.console_ansi)
                    .boxed(),
            );
        }

        let (file, guard) = if let Some(folder) = config.folder {
            let daily = DailyFile::open(folder, name.as_str(), config.max_files)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(daily.clone());

            layers.push(
                layer()
                    .event_format(formatter)
                    .with_writer(non_blocking)
                    .with_ansi(config.file_ansi)
                    .boxed(),
            );
            (Some(daily), Some(guard))
        } else {
            (None, None)
        };

        if layers.is_empty() {
            return Err(LoggerError::invalid(
                "No logging layers enabled. Enable console or file output.",
            ));
        }

        let dispatch = Dispatch::new(tracing_subscriber::registry().with(env_filter).with(layers));
        let logger = Logger { name, level: config.level, format, file, dispatch, guard };
        logger.in_scope(|| {
            tracing::trace!(logger = %logger.name, file = ?logger.file_path(), "Logger built");
        });

        Ok(logger)
    }

    /// Builds the logger and installs it as the process-wide default subscriber.
    ///
    /// # Returns
    /// A [`Logger`] handle. **Note:** with file output this handle contains a
    /// [`WorkerGuard`] that must be kept alive for the duration of the program to
    /// ensure that non-blocking logs are flushed correctly.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber has already been set.
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid builder settings.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let logger = self.build()?;
        tracing::dispatcher::set_global_default(logger.dispatch.clone())
            .context(format!("Installing logger '{}'", logger.name))?;
        Ok(logger)
    }
}

/// A handle to a configured logger.
///
/// Holds the file worker guard (if any); dropping the handle flushes pending file output.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    name: String,
    level: LevelFilter,
    format: FormatHandle,
    file: Option<DailyFile>,
    dispatch: Dispatch,
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`].
    ///
    /// The `name` identifies the logger and is the stem of its daily log files
    /// (e.g., `logs/2024-05-01-my-app.log`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use logkit_logger::{LevelFilter, Logger};
    ///
    /// let logger = Logger::builder()
    ///     .name("my-app")
    ///     .level(LevelFilter::INFO)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(logger.name(), "my-app");
    /// ```
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder {
            config: LoggerConfig::default(),
            name: NoName,
            file_state: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn level(&self) -> LevelFilter {
        self.level
    }

    /// The line layout currently used by every sink.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format.get()
    }

    /// Switches the line layout of every sink, effective for the next record.
    pub fn set_format(&self, format: LogFormat) {
        self.format.set(format);
    }

    /// Today's log file, or `None` without file output.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_ref().map(DailyFile::current_path)
    }

    /// Returns a reference to the underlying worker guard, if present.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }

    /// The subscriber behind this logger, e.g. for `tracing::dispatcher::with_default`.
    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this logger as the current thread's default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    #[track_caller]
    pub fn trace(&self, message: impl Display) {
        self.emit(Severity::Trace, &message, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.emit(Severity::Debug, &message, Location::caller());
    }

    /// Logs `message` at `INFO`, attributed to the caller's file and line.
    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.emit(Severity::Info, &message, Location::caller());
    }

    #[track_caller]
    pub fn warning(&self, message: impl Display) {
        self.emit(Severity::Warning, &message, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.emit(Severity::Error, &message, Location::caller());
    }

    /// Logs `message` at `ERROR`, rendered as `CRITICAL`.
    #[track_caller]
    pub fn critical(&self, message: impl Display) {
        self.emit(Severity::Critical, &message, Location::caller());
    }

    fn emit(&self, severity: Severity, message: &dyn Display, caller: &'static Location<'static>) {
        let file = caller.file();
        let line = caller.line();
        self.in_scope(|| match severity {
            Severity::Trace => tracing::trace!(log.file = file, log.line = line, "{message}"),
            Severity::Debug => tracing::debug!(log.file = file, log.line = line, "{message}"),
            Severity::Info => tracing::info!(log.file = file, log.line = line, "{message}"),
            Severity::Warning => tracing::warn!(log.file = file, log.line = line, "{message}"),
            Severity::Error => tracing::error!(log.file = file, log.line = line, "{message}"),
            Severity::Critical => {
                tracing::error!(log.file = file, log.line = line, critical = true, "{message}");
            },
        });
    }

    /// Forces file output already handed to the OS onto disk.
    ///
    /// Records still queued in the non-blocking worker are written when this handle drops.
    ///
    /// # Errors
    /// Returns [`LoggerError::Io`] if syncing the current file fails.
    pub fn flush(&self) -> Result<(), LoggerError> {
        self.file.as_ref().map_or(Ok(()), DailyFile::sync)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            self.in_scope(|| tracing::trace!("Logging system shutting down, flushing buffers..."));
        }
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::invalid("Logger name cannot be empty"));
    }

    if config.max_files == Some(0) {
        return Err(LoggerError::invalid("max_files must be greater than zero"));
    }

    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    config.env_filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder
                .parse(filter)
                .map_err(|e| LoggerError::invalid(format!("Invalid env filter '{filter}': {e}")))
        },
    )
}
