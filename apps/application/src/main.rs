use anyhow::Context;
use clap::Parser;
use logkit_logger::{LogFormat, LoggerSettings, load_settings};
use std::path::PathBuf;

/// Logs a greeting through the `application` logger.
#[derive(Debug, Parser)]
#[command(name = "application")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Runs the application with its configured logger")]
struct Cli {
    /// Settings file (defaults to an optional `logkit.toml` in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Minimum level: trace, debug, info, warning, error or critical
    #[arg(short, long)]
    level: Option<String>,
    /// Line layout: standard, compact or json
    #[arg(short, long)]
    format: Option<LogFormat>,
    /// Also write to `<folder>/<date>-application.log`
    #[arg(long)]
    file_logging: bool,
    /// Folder for log files
    #[arg(long)]
    folder: Option<PathBuf>,
    /// Message logged at INFO
    #[arg(short, long, default_value = "Hello, world!")]
    message: String,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<LoggerSettings> {
        let mut settings = load_settings(self.config.as_deref())
            .context("Failed to load logger settings")?;

        if let Some(level) = &self.level {
            settings.level.clone_from(level);
        }
        if let Some(format) = self.format {
            settings.format = format.name().to_owned();
        }
        if let Some(folder) = &self.folder {
            settings.folder.clone_from(folder);
        }
        settings.file_logging |= self.file_logging;

        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logs = cli.settings()?.init()?;

    logs.info(&cli.message);

    Ok(())
}
