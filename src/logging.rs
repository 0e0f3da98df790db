use colored::control::set_override;
use env_logger::Builder;
use log::LevelFilter;

/// Log level for a run: `Debug` with `--verbose`, `Info` otherwise.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

pub fn init_logging(verbose: bool, no_color: bool) {
    if no_color {
        set_override(false);
    }

    Builder::new()
        .filter_level(level_for(verbose))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The logger can only be initialized once per process.

    #[test]
    fn verbose_logs_debug() {
        assert_eq!(level_for(true), LevelFilter::Debug);
    }

    #[test]
    fn default_logs_info() {
        assert_eq!(level_for(false), LevelFilter::Info);
    }
}
