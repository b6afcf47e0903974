use crate::core::ast::{build::*, Rule};

lazy_static! {
    /// The core rules of RFC 5234 Appendix B.1, available to every grammar.
    pub static ref CORE_RULES: Vec<Rule> = vec![
        rule("ALPHA", alt(vec![range('A', 'Z'), range('a', 'z')])),
        rule("BIT", chars("01")),
        rule("CHAR", range('\u{01}', '\u{7F}')),
        rule("CR", chars("\r")),
        rule("CRLF", seq(vec![name("CR"), name("LF")])),
        rule("CTL", alt(vec![range('\u{00}', '\u{1F}'), chars("\u{7F}")])),
        rule("DIGIT", range('0', '9')),
        rule("DQUOTE", chars("\"")),
        rule("HEXDIG", alt(vec![name("DIGIT"), range('A', 'F')])),
        rule("HTAB", chars("\t")),
        rule("LF", chars("\n")),
        rule(
            "LWSP",
            any(alt(vec![name("WSP"), seq(vec![name("CRLF"), name("WSP")])])),
        ),
        rule("OCTET", range('\u{00}', '\u{FF}')),
        rule("SP", chars(" ")),
        rule("VCHAR", range('\u{21}', '\u{7E}')),
        rule("WSP", alt(vec![name("SP"), name("HTAB")])),
    ];
}

pub fn core_rule(name: &str) -> Option<&'static Rule> {
    CORE_RULES.iter().find(|rule| rule.name() == name)
}

pub fn is_core_rule(name: &str) -> bool {
    core_rule(name).is_some()
}
