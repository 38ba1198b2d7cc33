// Tracing subscriber setup

use tracing::Level;

/// Pick the log level from CLI flags; an explicit level wins
pub fn level_for(verbose: bool, quiet: bool, explicit: Option<&str>) -> Level {
    if let Some(level) = explicit {
        return parse_level(level);
    }
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the stderr subscriber. Source locations only at debug and below.
pub fn init_logging(level: Level) {
    let debug = level >= Level::DEBUG;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(false, false, None), Level::WARN);
        assert_eq!(level_for(true, false, None), Level::DEBUG);
        assert_eq!(level_for(false, true, None), Level::ERROR);
        assert_eq!(level_for(true, true, Some("trace")), Level::TRACE);
        assert_eq!(level_for(false, false, Some("bogus")), Level::INFO);
    }
}
