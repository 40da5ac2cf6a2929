use std::fmt::Display;

use colored::{Color, Colorize};
use log::{Level, LevelFilter};

/// Everything outside of stranger only gets to report problems
const EXTERNAL_MAX_LEVEL: Level = Level::Warn;

/// Installs the global logger. Stranger's own crates log up to `max_level`.
pub fn init_logger(max_level: LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let target = Target::from(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{} {} {:^8} {}",
                Badge(record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .filter(move |meta| is_allowed(&Target::from(meta.target()), meta.level(), max_level))
        .chain(std::io::stdout())
        .apply()
        .expect("logger is only installed once")
}

fn is_allowed(target: &Target, level: Level, max_level: LevelFilter) -> bool {
    match target {
        Target::External(_) => level <= EXTERNAL_MAX_LEVEL,
        _ => level <= max_level,
    }
}

/// Colors used for highlighted log output
pub enum LogColor {
    Red,
    Dimmed,
}

impl From<LogColor> for Color {
    fn from(value: LogColor) -> Self {
        match value {
            LogColor::Red => Color::Red,
            LogColor::Dimmed => Color::BrightBlack,
        }
    }
}

/// Which part of the program a record came from, by its crate
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Main,
    Core,
    Server,
    External(String),
}

impl From<&str> for Target {
    fn from(target: &str) -> Self {
        match target.split("::").next().unwrap_or_default() {
            "stranger" => Self::Main,
            "stranger_core" => Self::Core,
            "stranger_server" => Self::Server,
            other => Self::External(other.to_string()),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Main => "MAIN".bright_purple(),
            Self::Core => "CORE".blue(),
            Self::Server => "SERVER".bright_green(),
            Self::External(name) => name.as_str().clear(),
        };

        Display::fmt(&label, f)
    }
}

struct Badge(Level);

impl Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let badge = match self.0 {
            Level::Error => " ERR ".black().on_red().bold(),
            Level::Warn => " WRN ".black().on_yellow().bold(),
            Level::Info => " INF ".black().on_blue().bold(),
            Level::Debug => " DBG ".white().on_black(),
            Level::Trace => " TRC ".clear(),
        };

        Display::fmt(&badge, f)
    }
}
