//! A log file that follows the calendar: `<folder>/<YYYY-MM-DD>-<stem>.log`.

use crate::error::{LoggerError, LoggerErrorExt};
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const LOG_FILE_SUFFIX: &str = "log";

pub(crate) type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Name of the log file for `stem` on `date`.
#[must_use]
pub fn file_name(stem: &str, date: NaiveDate) -> String {
    format!("{}-{stem}.{LOG_FILE_SUFFIX}", date.format(DATE_FORMAT))
}

/// Append-only writer that reopens its file when the local date changes.
///
/// Clones share the same underlying file.
#[derive(Clone)]
pub struct DailyFile {
    state: Arc<Mutex<DailyState>>,
}

struct DailyState {
    folder: PathBuf,
    stem: String,
    max_files: Option<usize>,
    clock: Clock,
    date: NaiveDate,
    file: File,
}

impl DailyFile {
    /// Opens (or creates) today's file, creating `folder` when missing.
    ///
    /// With `max_files`, only that many of the newest `<date>-<stem>.log` files are kept.
    ///
    /// # Errors
    /// Returns [`LoggerError::Io`] if the folder or file cannot be created.
    pub fn open(
        folder: impl Into<PathBuf>,
        stem: impl Into<String>,
        max_files: Option<usize>,
    ) -> Result<Self, LoggerError> {
        Self::open_with_clock(folder, stem, max_files, Arc::new(|| Local::now().date_naive()))
    }

    pub(crate) fn open_with_clock(
        folder: impl Into<PathBuf>,
        stem: impl Into<String>,
        max_files: Option<usize>,
        clock: Clock,
    ) -> Result<Self, LoggerError> {
        let folder = folder.into();
        let stem = stem.into();

        fs::create_dir_all(&folder)
            .context(format!("Failed to create log folder: {}", folder.display()))?;

        let date = clock();
        let path = folder.join(file_name(&stem, date));
        let file = open_append(&path).context(format!("Failed to open {}", path.display()))?;

        let state = DailyState { folder, stem, max_files, clock, date, file };
        state.prune();

        Ok(Self { state: Arc::new(Mutex::new(state)) })
    }

    /// Path of today's file, which receives the next write.
    ///
    /// After the date changes this names the new file even before anything is written to it.
    #[must_use]
    pub fn current_path(&self) -> PathBuf {
        let state = self.state.lock();
        state.folder.join(file_name(&state.stem, (state.clock)()))
    }

    /// Forces written data of the current file to disk.
    ///
    /// # Errors
    /// Returns [`LoggerError::Io`] if the OS rejects the sync.
    pub fn sync(&self) -> Result<(), LoggerError> {
        self.state.lock().file.sync_data().context("Failed to sync log file")
    }
}

impl DailyState {
    fn roll_if_needed(&mut self) -> io::Result<()> {
        let today = (self.clock)();
        if today == self.date {
            return Ok(());
        }

        self.file.flush()?;
        self.file = open_append(&self.folder.join(file_name(&self.stem, today)))?;
        self.date = today;
        self.prune();
        Ok(())
    }

    /// Removes the oldest dated files beyond `max_files`. Foreign files are left alone.
    fn prune(&self) {
        let Some(max_files) = self.max_files else { return };
        let Ok(entries) = fs::read_dir(&self.folder) else { return };

        let suffix = format!("-{}.{LOG_FILE_SUFFIX}", self.stem);
        let mut dated: Vec<(NaiveDate, PathBuf)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let date = name.to_str()?.strip_suffix(&suffix)?;
                let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
                Some((date, entry.path()))
            })
            .collect();

        if dated.len() <= max_files {
            return;
        }

        dated.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in dated.into_iter().skip(max_files) {
            let _ = fs::remove_file(path);
        }
    }
}

impl Write for DailyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.roll_if_needed()?;
        state.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().file.flush()
    }
}

impl fmt::Debug for DailyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DailyFile")
            .field("folder", &state.folder)
            .field("stem", &state.stem)
            .field("date", &state.date)
            .field("max_files", &state.max_files)
            .finish_non_exhaustive()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
