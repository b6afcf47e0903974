use crate::core::ast::{build::*, Element, Rule};

lazy_static! {
    /// ABNF described in itself (RFC 5234 section 4, with the RFC 7405 `%s`/`%i` prefixes),
    /// arranged so that the first matching alternative is always the intended one:
    /// `repeat` tries the `*` form before a bare count and `defined-as` tries `=/`
    /// before `=`.
    pub static ref ABNF_RULES: Vec<Rule> = vec![
        rule(
            "rulelist",
            at_least(
                1,
                alt(vec![
                    name("rule"),
                    seq(vec![any(name("c-wsp")), name("c-nl")]),
                ]),
            ),
        ),
        rule(
            "rule",
            seq(vec![
                name("rulename"),
                name("defined-as"),
                name("elements"),
                name("c-nl"),
            ]),
        ),
        rule(
            "rulename",
            seq(vec![
                name("ALPHA"),
                any(alt(vec![name("ALPHA"), name("DIGIT"), chars("-")])),
            ]),
        ),
        rule(
            "defined-as",
            seq(vec![
                any(name("c-wsp")),
                alt(vec![seq(vec![chars("="), chars("/")]), chars("=")]),
                any(name("c-wsp")),
            ]),
        ),
        rule("elements", seq(vec![name("alternation"), any(name("c-wsp"))])),
        rule(
            "c-wsp",
            alt(vec![name("WSP"), seq(vec![name("c-nl"), name("WSP")])]),
        ),
        rule("c-nl", alt(vec![name("comment"), name("CRLF")])),
        rule(
            "comment",
            seq(vec![
                chars(";"),
                any(alt(vec![name("WSP"), name("VCHAR")])),
                name("CRLF"),
            ]),
        ),
        rule(
            "alternation",
            seq(vec![
                name("concatenation"),
                any(seq(vec![
                    any(name("c-wsp")),
                    chars("/"),
                    any(name("c-wsp")),
                    name("concatenation"),
                ])),
            ]),
        ),
        rule(
            "concatenation",
            seq(vec![
                name("repetition"),
                any(seq(vec![at_least(1, name("c-wsp")), name("repetition")])),
            ]),
        ),
        rule("repetition", seq(vec![optional(name("repeat")), name("element")])),
        rule(
            "repeat",
            alt(vec![
                seq(vec![any(name("DIGIT")), chars("*"), any(name("DIGIT"))]),
                at_least(1, name("DIGIT")),
            ]),
        ),
        rule(
            "element",
            alt(vec![
                name("rulename"),
                name("group"),
                name("option"),
                name("char-val"),
                name("num-val"),
                name("prose-val"),
            ]),
        ),
        rule("group", enclosed('(', ')')),
        rule("option", enclosed('[', ']')),
        rule(
            "char-val",
            alt(vec![
                name("case-insensitive-string"),
                name("case-sensitive-string"),
            ]),
        ),
        rule(
            "case-insensitive-string",
            seq(vec![
                optional(seq(vec![chars("%"), chars("Ii")])),
                name("quoted-string"),
            ]),
        ),
        rule(
            "case-sensitive-string",
            seq(vec![seq(vec![chars("%"), chars("Ss")]), name("quoted-string")]),
        ),
        rule(
            "quoted-string",
            seq(vec![
                name("DQUOTE"),
                any(alt(vec![range('\u{20}', '\u{21}'), range('\u{23}', '\u{7E}')])),
                name("DQUOTE"),
            ]),
        ),
        rule(
            "num-val",
            seq(vec![
                chars("%"),
                alt(vec![name("bin-val"), name("dec-val"), name("hex-val")]),
            ]),
        ),
        rule("bin-val", num_val("Bb", "BIT")),
        rule("dec-val", num_val("Dd", "DIGIT")),
        rule("hex-val", num_val("Xx", "HEXDIG")),
        rule(
            "prose-val",
            seq(vec![
                chars("<"),
                any(alt(vec![range('\u{20}', '\u{3D}'), range('\u{3F}', '\u{7E}')])),
                chars(">"),
            ]),
        ),
    ];
}

fn enclosed(open: char, close: char) -> Element {
    seq(vec![
        range(open, open),
        any(name("c-wsp")),
        name("alternation"),
        any(name("c-wsp")),
        range(close, close),
    ])
}

/// `<prefix> 1*<digit> [ 1*("." 1*<digit>) / ("-" 1*<digit>) ]`
fn num_val(prefix: &str, digit: &str) -> Element {
    seq(vec![
        chars(prefix),
        at_least(1, name(digit)),
        optional(alt(vec![
            at_least(1, seq(vec![chars("."), at_least(1, name(digit))])),
            seq(vec![chars("-"), at_least(1, name(digit))]),
        ])),
    ])
}
