use {
    crate::core::{
        ast::{AstError, Rule},
        charset::CharSetError,
        compile::{abnf_rules::ABNF_RULES, assembler::RuleAssembler},
        gen::{self, GenError, Program},
    },
    std::{error, fmt},
};

pub mod abnf_rules;
mod assembler;

pub use self::assembler::position;

lazy_static! {
    static ref ABNF_PROGRAM: Result<Program, GenError> = gen::generate_program(&ABNF_RULES);
}

/// Compiles ABNF grammar text into its rules, in definition order. Lines must end in CRLF.
pub fn compile(text: &str) -> Result<Vec<Rule>, CompileError> {
    compile_from(text, 0)
}

/// Compiles the grammar text starting at byte offset `start`, which must run to the end of
/// `text`.
pub fn compile_from(text: &str, start: usize) -> Result<Vec<Rule>, CompileError> {
    let program = match *ABNF_PROGRAM {
        Ok(ref program) => program,
        Err(ref err) => return Err(CompileError::Bootstrap(err.clone())),
    };
    let rulelist = match program.matcher("rulelist") {
        Some(matcher) => matcher,
        None => return Err(CompileError::Internal("no rulelist routine".to_string())),
    };

    let mut assembler = RuleAssembler::new(start);
    let end = rulelist.run_traced(text, start, &mut assembler);
    let rules = assembler.finish(text, end)?;

    debug!("Compiled {} rules from {} bytes", rules.len(), text.len() - start);
    Ok(rules)
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CompileError {
    Incomplete {
        index: usize,
        line: usize,
        column: usize,
    },
    Redefinition(String),
    UndefinedIncremental(String),
    AstErr(AstError),
    CharSet(CharSetError),
    InvalidRange(String),
    InvalidNumber(String),
    Bootstrap(GenError),
    Internal(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CompileError::Incomplete {
                index,
                line,
                column,
            } => write!(
                f,
                "Failed to parse grammar beyond index {} ({}:{})",
                index, line, column
            ),
            CompileError::Redefinition(ref name) => {
                write!(f, "Invalid redefinition of existing rule \"{}\"", name)
            }
            CompileError::UndefinedIncremental(ref name) => write!(
                f,
                "Invalid incremental alternative for unknown rule \"{}\"",
                name
            ),
            CompileError::AstErr(ref err) => write!(f, "Invalid element: {}", err),
            CompileError::CharSet(ref err) => write!(f, "Invalid character value: {}", err),
            CompileError::InvalidRange(ref value) => {
                write!(f, "Invalid character range \"%{}\": start exceeds end", value)
            }
            CompileError::InvalidNumber(ref value) => {
                write!(f, "Invalid numeric value \"{}\"", value)
            }
            CompileError::Bootstrap(ref err) => {
                write!(f, "Failed to build the ABNF parser: {}", err)
            }
            CompileError::Internal(ref msg) => write!(f, "Internal compiler error: {}", msg),
        }
    }
}

impl error::Error for CompileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            CompileError::AstErr(ref err) => Some(err),
            CompileError::CharSet(ref err) => Some(err),
            CompileError::Bootstrap(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<AstError> for CompileError {
    fn from(err: AstError) -> CompileError {
        CompileError::AstErr(err)
    }
}

impl From<CharSetError> for CompileError {
    fn from(err: CharSetError) -> CompileError {
        CompileError::CharSet(err)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::core::{
            ast::{build::*, Element},
            util::string_utils::normalize_line_endings,
        },
    };

    #[test]
    fn compile_single_rule() {
        //setup
        let text = "greeting = \"hi\" SP name\r\n";

        //exercise
        let res = compile(text).unwrap();

        //verify
        assert_eq!(
            res,
            vec![rule(
                "greeting",
                seq(vec![
                    seq(vec![chars("hH"), chars("iI")]),
                    name("SP"),
                    name("name"),
                ])
            )]
        );
    }

    #[test]
    fn compile_operators() {
        //setup
        let text = "\
a = b / c d / (e / f)\r\n\
b = *c 1*d *3e 2f 2*4g [h]\r\n\
c = %s\"Ab\" / %i\"c\" / \"\"\r\n\
d = %x41 / %d13.10 / %b110000-111001\r\n\
e = 0<pchar> <fallback>\r\n";

        //exercise
        let res = compile(text).unwrap();

        //verify
        assert_eq!(
            res,
            vec![
                rule(
                    "a",
                    alt(vec![
                        name("b"),
                        seq(vec![name("c"), name("d")]),
                        alt(vec![name("e"), name("f")]),
                    ])
                ),
                rule(
                    "b",
                    seq(vec![
                        any(name("c")),
                        at_least(1, name("d")),
                        repeat(0, Some(3), name("e")),
                        repeat(2, Some(2), name("f")),
                        repeat(2, Some(4), name("g")),
                        optional(name("h")),
                    ])
                ),
                rule(
                    "c",
                    alt(vec![
                        seq(vec![chars("A"), chars("b")]),
                        chars("cC"),
                        Element::empty(),
                    ])
                ),
                rule(
                    "d",
                    alt(vec![
                        chars("A"),
                        seq(vec![chars("\r"), chars("\n")]),
                        range('0', '9'),
                    ])
                ),
                rule(
                    "e",
                    seq(vec![repeat(0, Some(0), name("pchar")), name("fallback")])
                ),
            ]
        );
    }

    #[test]
    fn compile_comments_and_continuations() {
        //setup
        let text = concat!(
            "; leading comment\r\n",
            "\r\n",
            "list  =  item\r\n",
            "         *( \",\" item ) ; trailing comment\r\n",
            "           ; comment on its own line\r\n",
            "\r\n",
            "item  =  \"x\"\r\n",
            "item =/ \"y\" ; more\r\n",
        );

        //exercise
        let res = compile(text).unwrap();

        //verify
        assert_eq!(
            res,
            vec![
                rule(
                    "list",
                    seq(vec![name("item"), any(seq(vec![chars(","), name("item")]))])
                ),
                rule("item", alt(vec![chars("xX"), chars("yY")])),
            ]
        );
    }

    #[test]
    fn compile_undefined_incremental() {
        //exercise
        let res = compile("item =/ \"x\"\r\n");

        //verify
        assert_eq!(
            res,
            Err(CompileError::UndefinedIncremental("item".to_string()))
        );
    }

    #[test]
    fn compile_incremental_alternatives() {
        //setup
        let text = "\
ruleset = alt1 / alt2\r\n\
ruleset =/ alt3\r\n\
ruleset =/ alt4 / alt5\r\n\
other = \"o\"\r\n\
other =/ \"p\"\r\n";

        //exercise
        let res = compile(text).unwrap();

        //verify
        assert_eq!(
            res,
            vec![
                rule(
                    "ruleset",
                    alt(vec![
                        name("alt1"),
                        name("alt2"),
                        name("alt3"),
                        alt(vec![name("alt4"), name("alt5")]),
                    ])
                ),
                rule("other", alt(vec![chars("oO"), chars("pP")])),
            ]
        );
    }

    #[test]
    fn compile_redefinition() {
        //setup
        let text = "a = \"x\"\r\nb = a\r\na = \"y\"\r\n";

        //exercise
        let res = compile(text);

        //verify
        assert_eq!(res, Err(CompileError::Redefinition("a".to_string())));
        assert_eq!(
            format!("{}", res.err().unwrap()),
            "Invalid redefinition of existing rule \"a\""
        );
    }

    #[test]
    fn compile_invalid_repetition() {
        //exercise
        let res = compile("a = 3*2b\r\n");

        //verify
        assert_eq!(
            res,
            Err(CompileError::AstErr(AstError::InvalidRepetition(3, 2)))
        );
    }

    #[test]
    fn compile_invalid_values() {
        assert_eq!(
            compile("a = %x39-30\r\n"),
            Err(CompileError::InvalidRange("x39-30".to_string()))
        );
        assert_eq!(
            compile("a = %d200\r\n"),
            Err(CompileError::CharSet(CharSetError::NonAscii('\u{C8}')))
        );
    }

    #[test]
    fn compile_incomplete() {
        //setup
        let text = "a = \"b\"\r\nb = c d\r\n?\r\n";

        //exercise
        let res = compile(text);

        //verify
        assert_eq!(
            res,
            Err(CompileError::Incomplete {
                index: 18,
                line: 3,
                column: 1,
            })
        );
        assert_eq!(
            format!("{}", res.err().unwrap()),
            "Failed to parse grammar beyond index 18 (3:1)"
        );
    }

    #[test]
    fn compile_missing_crlf() {
        //exercise
        let res = compile("a = \"b\"");

        //verify
        assert_eq!(
            res,
            Err(CompileError::Incomplete {
                index: 7,
                line: 1,
                column: 8,
            })
        );
    }

    #[test]
    fn compile_from_offset() {
        //setup
        let text = "junk\r\nword = 1*ALPHA\r\n";

        //exercise
        let res = compile_from(text, 6).unwrap();

        //verify
        assert_eq!(res, vec![rule("word", at_least(1, name("ALPHA")))]);
        assert!(compile(text).is_err());
    }

    #[test]
    fn compile_abnf_grammar() {
        //setup
        let text = normalize_line_endings(include_str!("../../../tests/grammars/abnf.abnf"));

        //exercise
        let res = compile(&text).unwrap();

        //verify
        assert_eq!(res, *ABNF_RULES);
    }
}
