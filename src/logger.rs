use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record};

/// Info records are the tool's normal output ("Creating ...", "File downloaded
/// to ...") and print bare. Debug and trace go to stdout behind a dimmed module
/// tag so they read in order with the progress status. Warnings and errors go to
/// stderr.
pub struct Logger;

static LOGGER: Logger = Logger;

/// Installs the logger. Info is the default level, debug with `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        match record.level() {
            Level::Error | Level::Warn => eprintln!("{}", line(record)),
            _ => println!("{}", line(record)),
        }
    }

    fn flush(&self) {}
}

fn line(record: &Record) -> String {
    let module = record
        .target()
        .strip_prefix(concat!(env!("CARGO_CRATE_NAME"), "::"))
        .unwrap_or(record.target());

    match record.level() {
        Level::Info => record.args().to_string(),
        Level::Error => format!("{} {}", "error:".bold().red(), record.args()),
        Level::Warn => format!("{} {}", "warning:".bold().yellow(), record.args()),
        Level::Debug | Level::Trace => {
            format!("{} {}", format!("{module}:").dimmed(), record.args())
        }
    }
}
