use {
    crate::core::{
        ast::Rule,
        charset::CharTest,
        gen::{Backend, GenError, RoutineDecl, RoutineId},
    },
    std::{ascii, collections::HashMap},
};

static KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

/// Emits a self-contained Rust module: a unit struct with one `parse_*` function per
/// routine and a listener trait with `enter_*`/`exit_*` callbacks for the public ones.
/// Fragments are source lines, indented relative to their first line.
pub struct RustBackend {
    name: String,
    doc: Option<String>,
    routines: Vec<RoutineDecl>,
    idents: Vec<String>,
    functions: Vec<Vec<String>>,
    labels: usize,
}

impl RustBackend {
    pub fn new(name: &str, doc: Option<&str>) -> Result<Self, GenError> {
        if !is_identifier(name) {
            return Err(GenError::InvalidIdentifier(name.to_string()));
        }
        Ok(RustBackend {
            name: name.to_string(),
            doc: doc.map(|doc| doc.to_string()),
            routines: vec![],
            idents: vec![],
            functions: vec![],
            labels: 0,
        })
    }

    fn label(&mut self, kind: char) -> String {
        self.labels += 1;
        format!("'{}{}", kind, self.labels)
    }

    fn listener(&self) -> String {
        format!("{}Listener", self.name)
    }
}

impl Backend for RustBackend {
    type Fragment = Vec<String>;
    type Output = String;

    fn declare(&mut self, routines: &[RoutineDecl]) -> Result<(), GenError> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        for decl in routines {
            let ident = snake_case(&decl.name);
            if let Some(owner) = owners.get(&ident) {
                return Err(GenError::IdentifierClash(
                    owner.to_string(),
                    decl.name.clone(),
                    ident,
                ));
            }
            owners.insert(ident.clone(), &decl.name);
            self.idents.push(ident);
        }
        self.routines = routines.to_vec();
        self.functions = vec![vec![]; routines.len()];
        Ok(())
    }

    fn empty(&mut self) -> Vec<String> {
        vec!["Some(index)".to_string()]
    }

    fn terminal(&mut self, test: CharTest) -> Vec<String> {
        let condition = match test {
            CharTest::Never => return vec!["None".to_string()],
            CharTest::Eq(c) => format!("c == {}", byte_literal(c)),
            CharTest::OneOf { chars, len } => chars[..len]
                .iter()
                .map(|&c| format!("c == {}", byte_literal(c)))
                .collect::<Vec<String>>()
                .join(" || "),
            CharTest::Mask { low, high } => mask_condition(low, high),
        };
        vec![
            "match input.get(index) {".to_string(),
            format!("    Some(&c) if {} => Some(index + 1),", condition),
            "    _ => None,".to_string(),
            "}".to_string(),
        ]
    }

    fn call(&mut self, target: RoutineId, forward_listener: bool) -> Vec<String> {
        let ident = &self.idents[target];
        let call = if !self.routines[target].public {
            format!("Self::parse_{}(input, index)", ident)
        } else if forward_listener {
            format!("Self::parse_{}(input, index, listener)", ident)
        } else {
            format!("Self::parse_{}(input, index, &mut ())", ident)
        };
        vec![call]
    }

    fn concatenation(&mut self, parts: Vec<Vec<String>>) -> Vec<String> {
        let label = self.label('c');
        let mut src = vec![
            format!("{}: {{", label),
            "    let mut index = index;".to_string(),
        ];
        for part in parts {
            embed(&mut src, 1, "let next = ", part, ";");
            src.push("    match next {".to_string());
            src.push("        Some(next) => index = next,".to_string());
            src.push(format!("        None => break {} None,", label));
            src.push("    }".to_string());
        }
        src.push("    Some(index)".to_string());
        src.push("}".to_string());
        src
    }

    fn alternation(&mut self, mut parts: Vec<Vec<String>>) -> Vec<String> {
        let label = self.label('a');
        let last = parts.pop();
        let mut src = vec![format!("{}: {{", label)];
        for part in parts {
            embed(&mut src, 1, "let next = ", part, ";");
            src.push("    if next.is_some() {".to_string());
            src.push(format!("        break {} next;", label));
            src.push("    }".to_string());
        }
        match last {
            Some(last) => embed(&mut src, 1, "", last, ""),
            None => src.push("    None".to_string()),
        }
        src.push("}".to_string());
        src
    }

    fn repetition(&mut self, min: usize, max: Option<usize>, body: Vec<String>) -> Vec<String> {
        let label = self.label('r');
        let loop_label = self.label('l');
        let counted = min > 0 || max.is_some();

        let mut src = vec![
            format!("{}: {{", label),
            "    let mut index = index;".to_string(),
        ];
        if counted {
            src.push("    let mut count: usize = 0;".to_string());
        }
        match max {
            Some(max) => src.push(format!("    {}: while count < {} {{", loop_label, max)),
            None => src.push(format!("    {}: loop {{", loop_label)),
        }
        embed(&mut src, 2, "let next = ", body, ";");
        src.push("        match next {".to_string());
        src.push("            Some(next) if next == index => {".to_string());
        if min > 0 {
            src.push(format!("                count = count.max({});", min));
        }
        src.push(format!("                break {};", loop_label));
        src.push("            }".to_string());
        src.push("            Some(next) => {".to_string());
        if counted {
            src.push("                count += 1;".to_string());
        }
        src.push("                index = next;".to_string());
        src.push("            }".to_string());
        src.push(format!("            None => break {},", loop_label));
        src.push("        }".to_string());
        src.push("    }".to_string());
        if min > 0 {
            src.push(format!("    if count < {} {{", min));
            src.push(format!("        break {} None;", label));
            src.push("    }".to_string());
        }
        src.push("    Some(index)".to_string());
        src.push("}".to_string());
        src
    }

    fn routine(&mut self, id: RoutineId, rule: &Rule, body: Vec<String>) {
        let ident = self.idents[id].clone();
        let mut src = vec![format!("    /// `{}`", rule)];
        if self.routines[id].public {
            src.push(format!(
                "    pub fn parse_{}(input: &[u8], start_index: usize, listener: &mut dyn {}) -> Option<usize> {{",
                ident,
                self.listener()
            ));
            src.push(format!("        listener.enter_{}(input, start_index);", ident));
            src.push("        let index = start_index;".to_string());
            embed(&mut src, 2, "let end_index = ", body, ";");
            src.push(format!(
                "        listener.exit_{}(input, start_index, end_index);",
                ident
            ));
            src.push("        end_index".to_string());
        } else {
            src.push(format!(
                "    fn parse_{}(input: &[u8], index: usize) -> Option<usize> {{",
                ident
            ));
            embed(&mut src, 2, "", body, "");
        }
        src.push("    }".to_string());
        self.functions[id] = src;
    }

    fn finish(self) -> String {
        let mut src: Vec<String> = vec![
            "// Generated by abnfgen. Do not edit.".to_string(),
            String::new(),
        ];

        if let Some(ref doc) = self.doc {
            for line in doc.lines() {
                if line.is_empty() {
                    src.push("///".to_string());
                } else {
                    src.push(format!("/// {}", line));
                }
            }
        }
        src.push(format!("pub struct {};", self.name));
        src.push(String::new());

        src.push(format!(
            "/// Callbacks fired around each public rule of [`{}`].",
            self.name
        ));
        src.push(format!("pub trait {} {{", self.listener()));
        let mut first = true;
        for (decl, ident) in self.routines.iter().zip(self.idents.iter()) {
            if !decl.public {
                continue;
            }
            if !first {
                src.push(String::new());
            }
            first = false;
            src.push(format!(
                "    fn enter_{}(&mut self, _input: &[u8], _start_index: usize) {{}}",
                ident
            ));
            src.push(format!(
                "    fn exit_{}(&mut self, _input: &[u8], _start_index: usize, _end_index: Option<usize>) {{}}",
                ident
            ));
        }
        src.push("}".to_string());
        src.push(String::new());
        src.push(format!("impl {} for () {{}}", self.listener()));
        src.push(String::new());

        src.push(
            "#[allow(dead_code, unused_mut, unused_variables, unused_assignments, unused_labels, clippy::all)]"
                .to_string(),
        );
        src.push(format!("impl {} {{", self.name));
        for (i, function) in self.functions.into_iter().enumerate() {
            if i != 0 {
                src.push(String::new());
            }
            src.extend(function);
        }
        src.push("}".to_string());

        let mut text = src.join("\n");
        text.push('\n');
        text
    }
}

/// Appends `fragment` to `src` at `depth` levels of indentation, with `prefix` before
/// its first line and `suffix` after its last.
fn embed(src: &mut Vec<String>, depth: usize, prefix: &str, fragment: Vec<String>, suffix: &str) {
    let indent = "    ".repeat(depth);
    let last = fragment.len().saturating_sub(1);
    for (i, line) in fragment.into_iter().enumerate() {
        let mut line = if i == 0 {
            format!("{}{}{}", indent, prefix, line)
        } else {
            format!("{}{}", indent, line)
        };
        if i == last {
            line.push_str(suffix);
        }
        src.push(line);
    }
}

fn mask_condition(low: u64, high: u64) -> String {
    let mut tests: Vec<String> = vec![];
    if low != 0 {
        tests.push(format!("(c < 64 && (1u64 << c) & 0x{:016X} != 0)", low));
    }
    if high != 0 {
        tests.push(format!(
            "(c >= 64 && c < 128 && (1u64 << (c - 64)) & 0x{:016X} != 0)",
            high
        ));
    }
    if tests.is_empty() {
        return "false".to_string();
    }
    tests.join(" || ")
}

fn byte_literal(b: u8) -> String {
    let escaped: String = ascii::escape_default(b).map(|b| b as char).collect();
    format!("b'{}'", escaped)
}

/// Maps a rule name onto the identifier suffix used for its routine: lower case, with
/// dashes as underscores.
pub fn snake_case(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_"
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}
