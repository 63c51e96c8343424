use chrono::Local;
use log::trace;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for each power reading.
pub trait Sink {
    fn record(&mut self, watts: f64) -> io::Result<()>;
}

/// Prints readings on stdout.
#[derive(Debug, Default)]
pub struct Console;

impl Sink for Console {
    fn record(&mut self, watts: f64) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", console_line(watts))
    }
}

#[must_use]
pub fn console_line(watts: f64) -> String {
    format!("CPU Package Power: {watts:.2} W")
}

/// Appends timestamped readings to the wattage log.
#[derive(Debug)]
pub struct WattageLog {
    path: PathBuf,
    file: File,
}

impl WattageLog {
    /// Open `path` for appending, creating it and its directory if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.exists() {
                trace!("Log directory doesn't exist, creating {dir:?}");
                fs::create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for WattageLog {
    fn record(&mut self, watts: f64) -> io::Result<()> {
        writeln!(
            self.file,
            "{} - {watts:.2} W",
            Local::now().format(LOG_TIMESTAMP_FORMAT)
        )
    }
}
