#[macro_use]
extern crate clap;
extern crate backtrace;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate abnfgen;

use {
    crate::cli::{cmd, logger},
    clap::App,
    std::process,
};

mod cli;

fn main() {
    let yaml = load_yaml!("cli/cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let res = logger::run_guarded(|| {
        logger::init(&matches);

        match matches.subcommand() {
            ("gen", Some(gen_matches)) => cmd::gen(gen_matches),
            ("check", Some(check_matches)) => cmd::check(check_matches),
            ("build", Some(build_matches)) => cmd::build(build_matches),
            (name, _) => logger::err(&format!("Unknown command '{}'", name)),
        }
    });

    if res.is_err() {
        process::exit(1);
    }
}
