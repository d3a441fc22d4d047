use std::{cmp::Ordering, path::PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Milliseconds since the unix epoch, the resolution used for last-watched pointers.
pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Compare two names the way a file browser does: digit runs by numeric value,
/// everything else case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut na = String::new();
                while let Some(c) = a.peek().copied().filter(char::is_ascii_digit) {
                    na.push(c);
                    a.next();
                }
                let mut nb = String::new();
                while let Some(c) = b.peek().copied().filter(char::is_ascii_digit) {
                    nb.push(c);
                    b.next();
                }
                let ta = na.trim_start_matches('0');
                let tb = nb.trim_start_matches('0');
                let ord = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// 初始化日志
pub fn init_log(log: Option<PathBuf>) -> anyhow::Result<WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    let subscriber_builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true);
    let (non_blocking, guard) = if let Some(log) = log {
        // output to file，daily rotate, non-blocking
        if !log.is_dir() {
            anyhow::bail!("log path is not a directory: {}", log.display());
        }
        let file_appender = tracing_appender::rolling::daily(log, "course_player.log");
        tracing_appender::non_blocking(file_appender)
    } else {
        // output to stderr, stdout carries command output
        tracing_appender::non_blocking(std::io::stderr())
    };
    let subscriber = subscriber_builder.with_writer(non_blocking).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_sorts_numbers_by_value() {
        let mut names = vec!["10. Wrap up", "2. Setup", "1. Intro", "02b"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["1. Intro", "2. Setup", "02b", "10. Wrap up"]);
    }

    #[test]
    fn natural_order_ignores_case() {
        assert_eq!(natural_cmp("chapter a", "Chapter A"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "B"), Ordering::Less);
    }
}
