extern crate clap;
extern crate colored;
extern crate log;
extern crate log4rs;
extern crate strip_ansi_escapes;

use {
    backtrace::Backtrace,
    std::{error::Error, io::Write, panic, sync::Mutex},
};

use self::{
    clap::ArgMatches,
    colored::{ColoredString, Colorize},
    log::{LevelFilter, Record},
    log4rs::{
        append::file::FileAppender,
        config::{Appender, Config, Root},
        encode::{pattern::PatternEncoder, writer::simple::SimpleWriter, Encode, Write as LogWrite},
        Handle,
    },
};

static DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

lazy_static! {
    static ref PREFIX_ERR: ColoredString = "error".bright_red();
    static ref PREFIX_FATAL: ColoredString = "fatal".on_bright_red();
    static ref PREFIX_GEN: ColoredString = "  GEN".bright_blue();
    static ref PREFIX_OK: ColoredString = "   OK".bright_green();
    static ref PREFIX_FAILED: ColoredString = "ERROR".bright_red();
    static ref LOGGER_HANDLE: Mutex<Option<Handle>> = Mutex::new(None);
}

/// Panic payload of `fatal`.
#[derive(Debug)]
pub enum Fatal {
    Error,
}

/// Runs `command`, returning `Err` if `fatal` aborted it. Any other panic is reported with
/// a backtrace and keeps unwinding.
pub fn run_guarded<F: FnOnce() + panic::UnwindSafe>(command: F) -> Result<(), Fatal> {
    panic::set_hook(Box::new(|info| {
        if info.payload().is::<Fatal>() {
            return;
        }
        let report = format!(
            "{}\n{:?}\nabnfgen crashed unexpectedly, please report this as a bug",
            info,
            Backtrace::new()
        );
        println!("{}", report);
        error!("{}", report);
    }));

    let res = panic::catch_unwind(command);
    let _ = panic::take_hook();

    match res {
        Ok(()) => Ok(()),
        Err(payload) => match payload.downcast::<Fatal>() {
            Ok(fatal) => Err(*fatal),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

pub fn init(matches: &ArgMatches) {
    if let Some(log_file) = matches.value_of("logfile") {
        let log_level = match matches.value_of("loglevel") {
            Some("error") => LevelFilter::Error,
            Some("warn") => LevelFilter::Warn,
            Some("info") => LevelFilter::Info,
            Some("debug") => LevelFilter::Debug,
            Some("trace") => LevelFilter::Trace,
            _ => DEFAULT_LOG_LEVEL,
        };

        let pattern_encoder = PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {l} - {m}{n}");

        let file_appender = match FileAppender::builder()
            .encoder(Box::new(PlainEncoder(pattern_encoder)))
            .build(log_file)
        {
            Ok(file_appender) => file_appender,
            Err(err) => fatal(&format!("Failed to open log file {}: {}", log_file, err)),
        };

        let config = match Config::builder()
            .appender(Appender::builder().build("file", Box::new(file_appender)))
            .build(Root::builder().appender("file").build(log_level))
        {
            Ok(config) => config,
            Err(err) => fatal(&format!("Failed to build logger configuration: {}", err)),
        };

        let mut handle_opt = match LOGGER_HANDLE.lock() {
            Ok(handle_opt) => handle_opt,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(ref handle) = *handle_opt {
            handle.set_config(config);
        } else {
            match log4rs::init_config(config) {
                Ok(handle) => *handle_opt = Some(handle),
                Err(err) => fatal(&format!("Failed to initialize logger: {}", err)),
            }
        }
    }

    info!(
        "
        _            __
  __ _ | |__  _ _   / _| __ _  ___  _ _
 / _` || '_ \\| ' \\ |  _|/ _` |/ -_)| ' \\
 \\__,_||_.__/|_||_||_|  \\__, |\\___||_||_|
                        |___/
"
    );
}

pub fn info(string: &str) {
    println!("{}", string);
    info!("{}", string);
}

pub fn err(string: &str) {
    println!("{}: {}", *PREFIX_ERR, string);
    error!("{}", string);
}

/// Reports an unrecoverable error and aborts the current command.
pub fn fatal(string: &str) -> ! {
    println!("{}: {}", *PREFIX_FATAL, string);
    error!("{}", string);
    panic::panic_any(Fatal::Error)
}

pub fn gen(string: &str) {
    println!("{}| {}", *PREFIX_GEN, string);
    debug!("Generating parser from {} ...", string);
}

pub fn gen_ok(string: &str) {
    println!("{}| {}", *PREFIX_OK, string);
    debug!("Finished generating {}", string);
}

pub fn gen_err(string: &str) {
    println!("{}| {}", *PREFIX_FAILED, string);
    error!("{}", string);
}

pub fn check_ok(string: &str) {
    println!("{}| {}", *PREFIX_OK, string);
    debug!("Matched {}", string);
}

pub fn check_err(string: &str) {
    println!("{}| {}", *PREFIX_FAILED, string);
    warn!("{}", string);
}

/// Log file encoder that drops the colour codes of console messages logged verbatim.
#[derive(Debug)]
struct PlainEncoder(PatternEncoder);

impl Encode for PlainEncoder {
    fn encode(
        &self,
        w: &mut dyn LogWrite,
        record: &Record,
    ) -> Result<(), Box<dyn Error + Sync + Send>> {
        let mut buf = SimpleWriter(Vec::new());
        self.0.encode(&mut buf, record)?;
        w.write_all(&strip_ansi_escapes::strip(&buf.0)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lines_are_plain() {
        //setup
        let encoder = PlainEncoder(PatternEncoder::new("{m}"));
        let coloured = format!("{}| grammar.abnf", "   OK".bright_green());
        let mut out = SimpleWriter(Vec::new());

        //exercise
        encoder
            .encode(&mut out, &Record::builder().args(format_args!("{}", coloured)).build())
            .unwrap();

        //verify
        assert_eq!(String::from_utf8(out.0).unwrap(), "   OK| grammar.abnf");
    }

    #[test]
    fn fatal_is_caught() {
        //exercise
        let aborted = run_guarded(|| fatal("grammar is broken"));
        let finished = run_guarded(|| info("done"));

        //verify
        assert!(aborted.is_err());
        assert!(finished.is_ok());
    }
}
