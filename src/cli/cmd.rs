extern crate clap;
extern crate colored;
extern crate regex;
extern crate stopwatch;

use {
    crate::cli::{
        checker::{self, CheckCommand},
        configuration,
        generator::{self, GenJob},
        logger,
    },
    std::{
        io::{self, Write},
        path::{Path, PathBuf},
        sync::Arc,
    },
};

use self::{
    clap::ArgMatches,
    colored::{ColoredString, Colorize},
    regex::Regex,
    stopwatch::Stopwatch,
};

pub fn gen(matches: &ArgMatches) {
    let job = GenJob {
        grammar_path: PathBuf::from(required(matches, "grammar")),
        name: required(matches, "name").to_string(),
        doc: matches.value_of("doc").map(str::to_string),
        output_path: matches.value_of("output").map(PathBuf::from),
    };

    match generator::generate(&job) {
        Ok(Some(source)) => {
            if let Err(err) = io::stdout().write_all(source.as_bytes()) {
                logger::fatal(&format!("Failed to write parser source: {}", err));
            }
        }
        Ok(None) => logger::gen_ok(&job.grammar_path.to_string_lossy()),
        Err(err) => logger::fatal(&format!(
            "Error generating parser from {}: {}",
            job.grammar_path.display(),
            err
        )),
    }
}

pub fn check(matches: &ArgMatches) {
    let mut sw = Stopwatch::new();
    sw.start();

    let grammar_path = Path::new(required(matches, "grammar"));
    logger::info(&format!("Loading grammar {} ...", grammar_path.display()));

    let program = match generator::load_program(grammar_path) {
        Ok(program) => program,
        Err(err) => logger::fatal(&format!(
            "Error loading grammar {}: {}",
            grammar_path.display(),
            err
        )),
    };

    let rule = required(matches, "rule");
    if program.matcher(rule).is_none() {
        logger::fatal(&format!(
            "Grammar {} has no rule \"{}\", expected one of: {}",
            grammar_path.display(),
            rule,
            program.rule_names().join(", ")
        ));
    }

    logger::info(&format!(
        "Successfully loaded grammar: {} rules",
        program.rule_names().len()
    ));

    let target_path = Path::new(required(matches, "target"));

    let file_regex: Option<Regex> = match matches.value_of("matching") {
        None => None,
        Some(regex) => match Regex::new(regex) {
            Ok(fn_regex) => Some(fn_regex),
            Err(err) => logger::fatal(&format!("Failed to build file name regex: {}", err)),
        },
    };

    let thread_count = thread_count(matches.value_of("threads"));

    println!();

    let metrics = checker::check(CheckCommand {
        program: Arc::new(program),
        rule: rule.to_string(),
        target_path,
        file_regex,
        thread_count,
    });

    sw.stop();
    print_final_status(
        sw.elapsed_ms(),
        metrics.total,
        metrics.matched,
        "matched",
        metrics.failed,
    );

    if metrics.failed > 0 {
        logger::fatal(&format!("{} files did not match", metrics.failed));
    }
}

pub fn build(matches: &ArgMatches) {
    let mut sw = Stopwatch::new();
    sw.start();

    let config_path = Path::new(required(matches, "config"));
    let config = match configuration::read_configuration(config_path) {
        Ok(config) => config,
        Err(err) => logger::fatal(&format!(
            "Error loading build configuration {}: {}",
            config_path.display(),
            err
        )),
    };

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new(""));

    println!();

    let mut generated = 0;
    let mut failed = 0;
    for grammar in &config.grammars {
        let job = grammar.to_job(base_dir);
        let grammar_path_string = job.grammar_path.to_string_lossy().to_string();

        logger::gen(&grammar_path_string);
        match generator::generate(&job) {
            Ok(_) => {
                logger::gen_ok(&grammar_path_string);
                generated += 1;
            }
            Err(err) => {
                logger::gen_err(&format!(
                    "Error generating parser from {}: {}",
                    grammar_path_string, err
                ));
                failed += 1;
            }
        }
    }

    sw.stop();
    print_final_status(
        sw.elapsed_ms(),
        config.grammars.len(),
        generated,
        "generated",
        failed,
    );

    if failed > 0 {
        logger::fatal(&format!("{} grammars failed to generate", failed));
    }
}

fn required<'a>(matches: &'a ArgMatches, arg: &str) -> &'a str {
    match matches.value_of(arg) {
        Some(value) => value,
        None => logger::fatal(&format!("Missing required argument '{}'", arg)),
    }
}

fn thread_count(threads: Option<&str>) -> usize {
    match threads {
        None => 1,
        Some(threads) => match str::parse::<usize>(threads) {
            Ok(threads) if threads > 0 => threads,
            _ => {
                logger::err(&format!(
                    "Invalid number of threads: '{}'. Falling back to one thread",
                    threads
                ));
                1
            }
        },
    }
}

pub fn print_final_status(
    elapsed_ms: i64,
    total: usize,
    passed: usize,
    passed_label: &str,
    failed: usize,
) {
    let mut passed_msg: ColoredString = format!("{} {}", passed, passed_label).normal();
    if passed > 0 {
        passed_msg = passed_msg.bright_green()
    }

    let mut failed_msg = format!("{} failed", failed).normal();
    if failed > 0 {
        failed_msg = failed_msg.bright_red()
    }

    println!();
    logger::info(&format!(
        "COMPLETE: {}ms : {} processed, {}, {}",
        elapsed_ms, total, passed_msg, failed_msg
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_fallback() {
        assert_eq!(thread_count(None), 1);
        assert_eq!(thread_count(Some("4")), 4);
        assert_eq!(thread_count(Some("0")), 1);
        assert_eq!(thread_count(Some("many")), 1);
    }
}
