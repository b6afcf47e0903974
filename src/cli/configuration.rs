extern crate serde;
extern crate serde_yaml;

use {
    crate::cli::generator::GenJob,
    serde::Deserialize,
    std::{error, fmt, fs::File, io::Read, path::Path},
};

/// A batch of grammars to generate parsers for, read from YAML:
///
/// ```yaml
/// grammars:
///   - grammar: grammars/uri.abnf
///     name: Uri
///     doc: URI syntax from RFC 3986.
///     output: src/uri.rs
/// ```
#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfiguration {
    pub grammars: Vec<GrammarConfiguration>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarConfiguration {
    pub grammar: String,
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl GrammarConfiguration {
    /// Paths are taken relative to `base_dir`. Without an output path the parser is written
    /// next to its grammar, with an `.rs` extension.
    pub fn to_job(&self, base_dir: &Path) -> GenJob {
        let grammar_path = base_dir.join(&self.grammar);
        let output_path = match self.output {
            Some(ref output) => base_dir.join(output),
            None => grammar_path.with_extension("rs"),
        };

        GenJob {
            grammar_path,
            name: self.name.clone(),
            doc: self.doc.clone(),
            output_path: Some(output_path),
        }
    }
}

pub fn read_configuration(path: &Path) -> Result<BuildConfiguration, ConfigurationError> {
    let mut conf_str = String::new();

    match File::open(path) {
        Ok(mut file) => {
            if let Err(err) = file.read_to_string(&mut conf_str) {
                return Err(ConfigurationError::IOErr(format!(
                    "Could not read configuration file \"{}\": {}",
                    path.display(),
                    err
                )));
            }
        }
        Err(err) => {
            return Err(ConfigurationError::IOErr(format!(
                "Could not find configuration file \"{}\": {}",
                path.display(),
                err
            )));
        }
    }

    parse_configuration(&conf_str)
}

pub fn parse_configuration(conf_str: &str) -> Result<BuildConfiguration, ConfigurationError> {
    Ok(serde_yaml::from_str(conf_str)?)
}

#[derive(Debug)]
pub enum ConfigurationError {
    IOErr(String),
    DeserializationErr(serde_yaml::Error),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigurationError::IOErr(ref err) => write!(f, "IO Error: {}", err),
            ConfigurationError::DeserializationErr(ref err) => {
                write!(f, "Failed to parse configuration file: {}", err)
            }
        }
    }
}

impl error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ConfigurationError::IOErr(_) => None,
            ConfigurationError::DeserializationErr(ref err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for ConfigurationError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigurationError::DeserializationErr(err)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::path::PathBuf};

    #[test]
    fn parse_full_configuration() {
        //setup
        let conf = "
grammars:
  - grammar: grammars/uri.abnf
    name: Uri
    doc: URI syntax.
    output: src/uri.rs
  - grammar: abnf.abnf
    name: Abnf
";

        //exercise
        let res = parse_configuration(conf).unwrap();

        //verify
        assert_eq!(
            res,
            BuildConfiguration {
                grammars: vec![
                    GrammarConfiguration {
                        grammar: "grammars/uri.abnf".to_string(),
                        name: "Uri".to_string(),
                        doc: Some("URI syntax.".to_string()),
                        output: Some("src/uri.rs".to_string()),
                    },
                    GrammarConfiguration {
                        grammar: "abnf.abnf".to_string(),
                        name: "Abnf".to_string(),
                        doc: None,
                        output: None,
                    },
                ],
            }
        );
    }

    #[test]
    fn jobs_resolve_paths() {
        //setup
        let conf = parse_configuration(
            "
grammars:
  - grammar: grammars/uri.abnf
    name: Uri
  - grammar: abnf.abnf
    name: Abnf
    output: gen/abnf.rs
",
        )
        .unwrap();
        let base = Path::new("project");

        //exercise
        let jobs: Vec<GenJob> = conf.grammars.iter().map(|g| g.to_job(base)).collect();

        //verify
        assert_eq!(
            jobs,
            vec![
                GenJob {
                    grammar_path: PathBuf::from("project/grammars/uri.abnf"),
                    name: "Uri".to_string(),
                    doc: None,
                    output_path: Some(PathBuf::from("project/grammars/uri.rs")),
                },
                GenJob {
                    grammar_path: PathBuf::from("project/abnf.abnf"),
                    name: "Abnf".to_string(),
                    doc: None,
                    output_path: Some(PathBuf::from("project/gen/abnf.rs")),
                },
            ]
        );
    }

    #[test]
    fn missing_name() {
        //exercise
        let res = parse_configuration("grammars:\n  - grammar: uri.abnf\n");

        //verify
        match res {
            Err(ConfigurationError::DeserializationErr(_)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
