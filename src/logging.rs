//! Colorized logging setup and the banner helper used for the
//! start/success/failure announcements of a run.

use colored::{ColoredString, Colorize};

/// Initializes `env_logger` with a level-tagged, colorized formatter,
/// seeded from `RUST_LOG` (default `info`).
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red(),
                log::Level::Warn => record.level().to_string().yellow(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().blue(),
                log::Level::Trace => record.level().to_string().dimmed(),
            };
            writeln!(buf, "[{level}] {}", record.args())
        })
        .init();
}

/// Prints a boxed banner around `title`, colored by `color_fn`.
pub fn print_banner(title: &str, color_fn: impl Fn(&str) -> ColoredString) {
    let width = title.len() + 4;
    let border = "=".repeat(width);
    println!("{}", color_fn(&border));
    println!("{}", color_fn(&format!("  {title}  ")));
    println!("{}", color_fn(&border));
}
