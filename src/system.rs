//! Small wrappers around the process environment.

use std::env;

const DEFAULT_WIDTH: usize = 80;
const SIZE_SUFFIXES: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Width of the current terminal.
///
/// `COLUMNS` wins when it holds a positive number, then the size reported by
/// the terminal on stdout, then 80 columns.
pub fn terminal_width() -> usize {
    if let Some(columns) = env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|columns| *columns > 0)
    {
        return columns;
    }

    match terminal_size::terminal_size() {
        Some((terminal_size::Width(w), _)) if w > 0 => usize::from(w),
        _ => DEFAULT_WIDTH,
    }
}

/// Peak resident set size of this process in bytes, when the OS reports it.
#[cfg(unix)]
pub fn max_rss_bytes() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getrusage succeeded, so the struct is initialized.
    let max_rss = u64::try_from(unsafe { usage.assume_init() }.ru_maxrss).ok()?;

    // macOS reports bytes, everyone else kilobytes.
    if cfg!(target_os = "macos") {
        Some(max_rss)
    } else {
        Some(max_rss * 1024)
    }
}

#[cfg(not(unix))]
pub fn max_rss_bytes() -> Option<u64> {
    None
}

/// Peak memory usage formatted for log lines.
pub fn max_memory_used() -> String {
    max_rss_bytes().map_or_else(|| "unknown".to_string(), natural_size)
}

/// Format a byte count with decimal suffixes, e.g. `1.5 kB` or `12 Bytes`.
pub fn natural_size(bytes: u64) -> String {
    if bytes == 1 {
        return "1 Byte".to_string();
    }
    if bytes < 1000 {
        return format!("{} Bytes", bytes);
    }

    let bytes = bytes as f64;
    let mut unit = 1000_f64;
    for suffix in SIZE_SUFFIXES {
        unit *= 1000.0;
        if bytes < unit {
            return format!("{:.1} {}", 1000.0 * bytes / unit, suffix);
        }
    }
    format!("{:.1} {}", 1000.0 * bytes / unit, SIZE_SUFFIXES[SIZE_SUFFIXES.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_size_small_values() {
        assert_eq!(natural_size(0), "0 Bytes");
        assert_eq!(natural_size(1), "1 Byte");
        assert_eq!(natural_size(999), "999 Bytes");
    }

    #[test]
    fn natural_size_decimal_suffixes() {
        assert_eq!(natural_size(1000), "1.0 kB");
        assert_eq!(natural_size(1500), "1.5 kB");
        assert_eq!(natural_size(2_000_000), "2.0 MB");
        assert_eq!(natural_size(3_300_000_000), "3.3 GB");
    }

    #[cfg(unix)]
    #[test]
    fn max_rss_is_reported() {
        assert!(max_rss_bytes().is_some_and(|bytes| bytes > 0));
        assert!(max_memory_used().ends_with('B'));
    }

    #[test]
    fn terminal_width_is_positive() {
        assert!(terminal_width() > 0);
    }
}
