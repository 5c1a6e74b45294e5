use std::io::Write;

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};

pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error, // default: only errors
        1 => LevelFilter::Info,  // -v: info and up
        2 => LevelFilter::Debug, // -vv: debug and up
        _ => LevelFilter::Trace, // -vvv: trace and up
    }
}

/// Logs go to stderr so streamed replies on stdout stay clean.
/// `RUST_LOG` still overrides the `-v` level per module.
pub fn init_logger(verbosity: u8) {
    let mut builder = Builder::new();
    builder.filter_level(level_for(verbosity));
    builder.parse_default_env();

    builder.format(|buf, record| {
        let level = record.level();

        let level_label = match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn  => "WARN ".yellow().bold(),
            Level::Info  => "INFO ".white().bold(),
            Level::Debug => "DEBUG".bright_black(),
            Level::Trace => "TRACE".bright_black(),
        };

        if level >= Level::Debug {
            let target = record.target().trim_start_matches("owlet::");
            writeln!(buf, "{} [{}] {}", level_label, target.dimmed(), record.args())
        } else {
            writeln!(buf, "{} {}", level_label, record.args())
        }
    });

    // A second init (e.g. from tests) is harmless.
    let _ = builder.try_init();
}
