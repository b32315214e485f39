pub mod config;
pub mod github;
pub mod mcp_client;
pub mod review;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "mcp_review_agent=info,warn";

/// Number of rotated log files kept next to the active one.
const LOG_FILES_KEPT: u32 = 3;

/// Initialize the tracing subscriber.
///
/// Without a log file, logs go to stderr so stdout carries only results.
/// With one, earlier logs are rotated (`agent.log.1` up to `.3`) and a
/// startup banner records the version and pid.
pub fn init_tracing(log_file: Option<&Path>) -> std::io::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let Some(log_path) = log_file else {
        fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(());
    };

    let file = open_log_file(log_path, LOG_FILES_KEPT)?;

    // `File` is unbuffered: every event reaches the OS as soon as it is
    // formatted, so a killed session still leaves its log behind.
    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== mcp-review-agent starting ==="
    );
    Ok(())
}

/// Create the log directory, rotate earlier logs, and open a fresh file.
fn open_log_file(path: &Path, keep: u32) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    rotate_log_file(path, keep);
    OpenOptions::new().create(true).append(true).open(path)
}

/// `agent.log` with `generation` 2 is `agent.log.2`; generation 0 is the
/// active file itself.
fn generation_path(base: &Path, generation: u32) -> PathBuf {
    if generation == 0 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

/// Shift every generation up by one and drop whatever falls past `keep`.
/// Gaps in the chain are fine; missing files are skipped.
fn rotate_log_file(base: &Path, keep: u32) {
    let _ = std::fs::remove_file(generation_path(base, keep));
    for generation in (0..keep).rev() {
        let _ = std::fs::rename(
            generation_path(base, generation),
            generation_path(base, generation + 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_generation_path() {
        let base = Path::new("/var/log/agent.log");
        assert_eq!(generation_path(base, 0), base);
        assert_eq!(generation_path(base, 3), Path::new("/var/log/agent.log.3"));
    }

    #[test]
    fn test_rotate_log_file_shifts_chain() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("agent.log");
        std::fs::write(&base, "current").unwrap();
        std::fs::write(tmp.path().join("agent.log.1"), "one").unwrap();
        std::fs::write(tmp.path().join("agent.log.3"), "three").unwrap();

        rotate_log_file(&base, 3);

        assert!(!base.exists());
        let read = |name: &str| std::fs::read_to_string(tmp.path().join(name)).unwrap();
        assert_eq!(read("agent.log.1"), "current");
        assert_eq!(read("agent.log.2"), "one");
        assert!(!tmp.path().join("agent.log.3").exists());
    }

    #[test]
    fn test_open_log_file_creates_dir_and_rotates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("agent.log");

        let mut first = open_log_file(&path, LOG_FILES_KEPT).unwrap();
        first.write_all(b"first run\n").unwrap();
        drop(first);

        let mut second = open_log_file(&path, LOG_FILES_KEPT).unwrap();
        second.write_all(b"second run\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second run\n");
        assert_eq!(
            std::fs::read_to_string(generation_path(&path, 1)).unwrap(),
            "first run\n"
        );
    }
}
