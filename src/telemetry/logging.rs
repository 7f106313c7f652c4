use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GLYPHWALK_LOG";
pub const LOG_FILE: &str = "glyphwalk.log";
const DEFAULT_FILTER: &str = "info";

const HEADER_LINE: &str = "-------------------------------------------------------------------------------";
const HEADER_TITLE: &str = "glyphwalk - tile exploration engine";

static INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("log file {path} unavailable: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },
    #[error("log subscriber install failed: {0}")]
    Install(String),
}

/// Installs the global subscriber once. With `to_file` the output goes to
/// `<root>/log/glyphwalk.log` instead of stderr.
pub fn init(root: &Path, to_file: bool) -> Result<(), LogError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    let filter = env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();
    let installed = if to_file {
        let file = open_log_file(root)?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };
    installed.map_err(|err| LogError::Install(err.to_string()))?;
    let _ = INSTALLED.set(());
    Ok(())
}

fn env_filter() -> Result<EnvFilter, LogError> {
    let raw = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    match raw {
        Some(filter) => EnvFilter::try_new(&filter).map_err(|err| LogError::Filter {
            message: err.to_string(),
            filter,
        }),
        None => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

fn open_log_file(root: &Path) -> Result<File, LogError> {
    let dir = root.join("log");
    std::fs::create_dir_all(&dir).map_err(|source| LogError::File {
        path: dir.clone(),
        source,
    })?;
    let path = dir.join(LOG_FILE);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LogError::File {
            path: path.clone(),
            source,
        })?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        write_header(&mut file).map_err(|source| LogError::File { path, source })?;
    }
    Ok(file)
}

fn write_header(file: &mut File) -> std::io::Result<()> {
    writeln!(file, "{HEADER_LINE}")?;
    writeln!(file, "{HEADER_TITLE}")?;
    writeln!(file, "{LOG_FILE} - started {}", format_date(unix_timestamp()))?;
    Ok(())
}

fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
fn format_date(ts: i64) -> String {
    let secs = ts.max(0);
    let (year, month, day) = civil_from_days(secs / 86_400);
    let seconds_of_day = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        seconds_of_day / 3_600,
        (seconds_of_day % 3_600) / 60,
        seconds_of_day % 60
    )
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_format_in_utc() {
        assert_eq!(format_date(0), "1970-01-01 00:00:00");
        assert_eq!(format_date(951_782_400), "2000-02-29 00:00:00");
        assert_eq!(format_date(1_700_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn log_file_gets_a_header_once() {
        let root = std::env::temp_dir().join(format!("glyphwalk-log-test-{}", unix_timestamp_nanos()));
        drop(open_log_file(&root).expect("open"));
        drop(open_log_file(&root).expect("reopen"));
        let text = std::fs::read_to_string(root.join("log").join(LOG_FILE)).expect("read");
        assert_eq!(text.matches(HEADER_TITLE).count(), 1);
        let _ = std::fs::remove_dir_all(&root);
    }

    fn unix_timestamp_nanos() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    }
}
