//! Console + optional file logging, modeled on `commands.rs`'s
//! `init_logging` (invoked from every `Commands::run` arm, though the
//! module itself wasn't retrieved): a console appender always runs, and
//! a debug-level file appender is added when a log path is given.

use std::path::Path;

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

const PATTERN: &str = "[{d(%Y-%m-%d %H:%M:%S)}] {h({l})} - {m}{n}";

/// Initializes the global logger. `verbose` raises the console level to
/// `Debug`; `log_filepath`, if given, additionally logs everything at
/// `Debug` to that file regardless of `verbose`.
pub fn init_logging(
    log_filepath: Option<&Path>,
    verbose: bool,
) -> log4rs::Handle {
    let console_level =
        if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .target(log4rs::append::console::Target::Stderr)
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)));
    let mut root_builder = Root::builder().appender("console");

    if let Some(path) = log_filepath {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)
            .expect("failed to open log file");
        builder =
            builder.appender(Appender::builder().build("file", Box::new(file)));
        root_builder = root_builder.appender("file");
        builder = builder.logger(
            Logger::builder().build("motif_liquidator", LevelFilter::Debug),
        );
    }

    let config = builder
        .build(root_builder.build(console_level))
        .expect("failed to build logging config");

    log4rs::init_config(config).expect("failed to initialize logger")
}
