use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use getset::Getters;

pub const CSV_FILE_NAME: &str = "ventes_2025.csv";
pub const LOG_FILE_NAME: &str = "app.log";
pub const DEFAULT_UPLOAD_LIMIT: usize = 100 * 1024 * 1024;

/// Directories and bind address shared by the CLI and the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Args, Getters)]
#[getset(get = "pub")]
pub struct Settings {
    /// Directory holding the input CSV.
    #[arg(long, env = "SALES_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory receiving charts, uploads and reports.
    #[arg(long, env = "SALES_REPORT_DIR", default_value = "reports")]
    report_dir: PathBuf,

    #[arg(long, env = "SALES_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Also write logs to `<log_dir>/app.log`.
    #[arg(long, env = "SALES_LOG_FILE")]
    log_to_file: bool,

    #[arg(long, env = "SALES_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Largest accepted `/upload` request body, in bytes.
    #[arg(long, env = "SALES_UPLOAD_LIMIT", default_value_t = DEFAULT_UPLOAD_LIMIT)]
    upload_limit: usize,
}

impl Settings {
    pub fn new(data_dir: impl Into<PathBuf>, report_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Settings {
        Settings {
            data_dir: data_dir.into(),
            report_dir: report_dir.into(),
            log_dir: log_dir.into(),
            ..Settings::default()
        }
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Settings {
        self.bind = bind.into();
        self
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Settings {
        self.upload_limit = bytes;
        self
    }

    pub fn csv_file(&self) -> PathBuf {
        self.data_dir.join(CSV_FILE_NAME)
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.report_dir.join("charts")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.report_dir.join("uploads")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.data_dir.clone(),
            self.report_dir.clone(),
            self.charts_dir(),
            self.uploads_dir(),
            self.log_dir.clone(),
        ] {
            fs::create_dir_all(dir)?;
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            report_dir: PathBuf::from("reports"),
            log_dir: PathBuf::from("logs"),
            log_to_file: false,
            bind: "127.0.0.1:8000".to_string(),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }
}

/// Writes every log line to both sinks.
struct Tee<A, B> {
    console: A,
    file: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        self.file.flush()
    }
}

/// Installs the global logger. `RUST_LOG` overrides the `info` default.
/// With `log_to_file` the output goes to stderr and `<log_dir>/app.log`.
/// Calling it twice is harmless.
pub fn init_logging(settings: &Settings) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if settings.log_to_file {
        fs::create_dir_all(&settings.log_dir)?;
        let file = OpenOptions::new().create(true).append(true).open(settings.log_file())?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee {
            console: io::stderr(),
            file,
        })));
    }

    let _ = builder.try_init();
    Ok(())
}
