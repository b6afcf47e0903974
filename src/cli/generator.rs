use {
    abnfgen::{self, BuildError, Program},
    std::{
        error, fmt,
        fs::{self, File},
        io::Read,
        path::{Path, PathBuf},
    },
};

/// One grammar to turn into a Rust parser.
#[derive(Debug, PartialEq, Clone)]
pub struct GenJob {
    pub grammar_path: PathBuf,
    pub name: String,
    pub doc: Option<String>,
    pub output_path: Option<PathBuf>,
}

/// Reads a grammar file, converting bare line feeds to CRLF.
pub fn load_grammar(grammar_path: &Path) -> Result<String, GenerationError> {
    let mut grammar = String::new();

    match File::open(grammar_path) {
        Ok(mut grammar_file) => {
            if let Err(err) = grammar_file.read_to_string(&mut grammar) {
                return Err(GenerationError::FileErr(format!(
                    "Could not read grammar file \"{}\": {}",
                    grammar_path.display(),
                    err
                )));
            }
        }
        Err(err) => {
            return Err(GenerationError::FileErr(format!(
                "Could not find grammar file \"{}\": {}",
                grammar_path.display(),
                err
            )))
        }
    }

    Ok(abnfgen::normalize_line_endings(&grammar))
}

pub fn load_program(grammar_path: &Path) -> Result<Program, GenerationError> {
    let grammar = load_grammar(grammar_path)?;
    let program = abnfgen::build_program(&grammar)?;
    debug!(
        "Built program for {} with rules {:?}",
        grammar_path.display(),
        program.rule_names()
    );
    Ok(program)
}

/// Generates the Rust source for `job`, returning it if the job has no output path and
/// writing it out otherwise.
pub fn generate(job: &GenJob) -> Result<Option<String>, GenerationError> {
    let grammar = load_grammar(&job.grammar_path)?;
    let source = abnfgen::build_rust(&grammar, &job.name, job.doc.as_ref().map(String::as_str))?;

    let output_path = match job.output_path {
        Some(ref output_path) => output_path,
        None => return Ok(Some(source)),
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                return Err(GenerationError::FileErr(format!(
                    "Could not create output directory \"{}\": {}",
                    parent.display(),
                    err
                )));
            }
        }
    }

    match fs::write(output_path, source.as_bytes()) {
        Ok(()) => {
            debug!(
                "Wrote {} bytes of parser source to {}",
                source.len(),
                output_path.display()
            );
            Ok(None)
        }
        Err(err) => Err(GenerationError::FileErr(format!(
            "Could not write output file \"{}\": {}",
            output_path.display(),
            err
        ))),
    }
}

#[derive(Debug)]
pub enum GenerationError {
    FileErr(String),
    BuildErr(BuildError),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenerationError::FileErr(ref err) => write!(f, "{}", err),
            GenerationError::BuildErr(ref err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            GenerationError::FileErr(_) => None,
            GenerationError::BuildErr(ref err) => Some(err),
        }
    }
}

impl From<BuildError> for GenerationError {
    fn from(err: BuildError) -> GenerationError {
        GenerationError::BuildErr(err)
    }
}
