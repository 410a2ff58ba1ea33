use std::io::IsTerminal;

/// Check if debug logging is enabled via environment variable
///
/// This is checked once at module initialization to avoid repeated environment variable lookups.
static DEBUG_ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
static DEBUG_PERFORMANCE_LEVEL: std::sync::OnceLock<u8> = std::sync::OnceLock::new();
static IS_TERMINAL: std::sync::OnceLock<bool> = std::sync::OnceLock::new();

fn is_debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| {
        (cfg!(debug_assertions)
            || std::env::var("GIT_THESEUS_DEBUG").unwrap_or_default() == "1"
            || !std::env::var("GIT_THESEUS_DEBUG_PERFORMANCE")
                .unwrap_or_default()
                .is_empty())
            && std::env::var("GIT_THESEUS_DEBUG").unwrap_or_default() != "0"
    })
}

fn debug_performance_level() -> u8 {
    *DEBUG_PERFORMANCE_LEVEL.get_or_init(|| {
        std::env::var("GIT_THESEUS_DEBUG_PERFORMANCE")
            .unwrap_or_default()
            .parse::<u8>()
            .unwrap_or(0)
    })
}

fn prefix(label: &str) -> String {
    if is_interactive_terminal() {
        format!("\x1b[1;33m[{}]\x1b[0m", label)
    } else {
        format!("[{}]", label)
    }
}

pub fn debug_performance_log(msg: &str) {
    if debug_performance_level() >= 1 {
        eprintln!("{} {}", prefix("git-theseus (perf)"), msg);
    }
}

/// Debug logging utility function
///
/// Prints debug messages with a colored prefix when debug assertions are enabled or when
/// the `GIT_THESEUS_DEBUG` environment variable is set to "1".
pub fn debug_log(msg: &str) {
    if is_debug_enabled() {
        eprintln!("{} {}", prefix("git-theseus"), msg);
    }
}

/// Always-on progress line on stderr.
pub fn log_message(msg: &str) {
    eprintln!("{} {}", prefix("git-theseus"), msg);
}

pub fn is_interactive_terminal() -> bool {
    *IS_TERMINAL.get_or_init(|| std::io::stderr().is_terminal())
}

/// Shorten a commit id for log output.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(7) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncates_full_hash() {
        assert_eq!(
            short_id("b36384d2da65869dce07f09c204d2e5407ee0dad"),
            "b36384d"
        );
    }

    #[test]
    fn test_short_id_keeps_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }
}
