use config::Map;
use logkit_logger::{LogFormat, LoggerError, LoggerSettings, load_settings, load_settings_with_env};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
    Some(pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect())
}

#[test]
fn missing_default_file_yields_defaults() -> Result<(), LoggerError> {
    let settings = load_settings_with_env(None::<&str>, env(&[]))?;
    assert_eq!(settings, LoggerSettings::default());
    Ok(())
}

#[test]
fn file_values_and_env_overrides_are_layered() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let folder = tmp.path().join("logs");
    let path = tmp.path().join("logging.toml");
    fs::write(
        &path,
        format!(
            "name = \"worker\"\nlevel = \"info\"\nfile_logging = true\nfolder = '{}'\nmax_files = 3\n",
            folder.display()
        ),
    )?;

    let settings = load_settings_with_env(
        Some(&path),
        env(&[("LOGKIT__FORMAT", "json"), ("LOGKIT__LEVEL", "warning")]),
    )?;

    assert_eq!(settings.name, "worker");
    assert_eq!(settings.level, "warning");
    assert!(settings.file_logging);
    assert_eq!(settings.folder, folder);
    assert_eq!(settings.max_files, Some(3));
    assert_eq!(settings.log_format()?, LogFormat::Json);

    let logger = LoggerSettings { console: false, ..settings }.build()?;
    let file = logger.file_path().expect("file output should be enabled");
    assert!(file.starts_with(&folder));
    assert_eq!(logger.format(), LogFormat::Json);
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let path = tmp.path().join("logging.toml");
    fs::write(&path, "name = \"worker\"\ncolour = \"always\"\n")?;

    let err = load_settings_with_env(Some(&path), env(&[])).expect_err("unknown key should fail");
    assert!(matches!(err, LoggerError::Settings { .. }), "got {err}");
    Ok(())
}

#[test]
fn explicit_path_is_required() {
    let missing = PathBuf::from("definitely/not/here/logging.toml");
    let err = load_settings(Some(&missing)).expect_err("missing file should fail");
    assert!(matches!(err, LoggerError::Settings { .. }));
}
