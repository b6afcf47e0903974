#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

use std::{error, fmt};

pub use self::core::{
    ast::{
        core_rules::{core_rule, is_core_rule, CORE_RULES},
        AstError, Element, Rule,
    },
    charset::{CharSet, CharSetError, CharTest},
    compile::{compile, compile_from, position, CompileError},
    gen::{
        generate, generate_program, generate_rust, Backend, GenError, Listener, Matcher,
        Program, ProgramBackend, RoutineDecl, RoutineId, RustBackend,
    },
    optimize::{optimize, optimize_all, optimize_element},
    reference::{collect_references, ReferenceError, RuleUniverse},
    util::{
        string_utils::normalize_line_endings,
        thread_pool::{PoolError, ThreadPool},
    },
};

mod core;

/// Compiles ABNF grammar text into an in-memory parser with one public matcher per rule
/// defined in `text`.
pub fn build_program(text: &str) -> Result<Program, BuildError> {
    let rules = compile(text)?;
    Ok(generate_program(&rules)?)
}

/// Compiles ABNF grammar text into Rust source for a parser type named `name`.
pub fn build_rust(text: &str, name: &str, doc: Option<&str>) -> Result<String, BuildError> {
    let rules = compile(text)?;
    Ok(generate_rust(name, doc, &rules)?)
}

#[derive(Debug)]
pub enum BuildError {
    CompileErr(CompileError),
    GenErr(GenError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BuildError::CompileErr(ref err) => write!(f, "Failed to compile grammar: {}", err),
            BuildError::GenErr(ref err) => write!(f, "Failed to generate parser: {}", err),
        }
    }
}

impl error::Error for BuildError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            BuildError::CompileErr(ref err) => Some(err),
            BuildError::GenErr(ref err) => Some(err),
        }
    }
}

impl From<CompileError> for BuildError {
    fn from(err: CompileError) -> BuildError {
        BuildError::CompileErr(err)
    }
}

impl From<GenError> for BuildError {
    fn from(err: GenError) -> BuildError {
        BuildError::GenErr(err)
    }
}
