use {
    crate::core::{
        ast::{Element, Rule},
        charset::CharSet,
        compile::CompileError,
        gen::Listener,
    },
    std::cmp,
};

/// Partial state for a rule whose trace is still open. Frames follow the enter/exit
/// nesting of the ABNF parse, so a failed attempt discards exactly what it produced.
enum Frame {
    Rule {
        name: Option<String>,
        incremental: bool,
        element: Option<Element>,
    },
    Elements(Vec<Element>),
    Repetition {
        count: Option<(usize, Option<usize>)>,
        elements: Vec<Element>,
    },
}

/// Builds rules from the trace of a parse of ABNF text.
pub struct RuleAssembler {
    rules: Vec<Rule>,
    frames: Vec<Frame>,
    furthest: usize,
    error: Option<CompileError>,
}

impl RuleAssembler {
    pub fn new(start: usize) -> Self {
        RuleAssembler {
            rules: vec![],
            frames: vec![],
            furthest: start,
            error: None,
        }
    }

    /// The rules assembled by a parse of `text` that ended at `end`.
    pub fn finish(self, text: &str, end: Option<usize>) -> Result<Vec<Rule>, CompileError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if end != Some(text.len()) {
            let (line, column) = position(text, self.furthest);
            return Err(CompileError::Incomplete {
                index: self.furthest,
                line,
                column,
            });
        }
        Ok(self.rules)
    }

    fn assemble(&mut self, rule: &str, text: &str, frame: Option<Frame>) -> Result<(), CompileError> {
        match rule {
            "rule" => match frame {
                Some(Frame::Rule {
                    name: Some(name),
                    incremental,
                    element: Some(element),
                }) => self.define(name, incremental, element),
                _ => Err(internal("incomplete rule frame")),
            },
            "rulename" => match self.frames.last_mut() {
                Some(Frame::Rule { ref mut name, .. }) => {
                    *name = Some(text.to_string());
                    Ok(())
                }
                _ => self.push(Element::rule_name(text)?),
            },
            "defined-as" => match self.frames.last_mut() {
                Some(Frame::Rule {
                    ref mut incremental,
                    ..
                }) => {
                    *incremental = is_incremental(text);
                    Ok(())
                }
                _ => Err(internal("defined-as outside of a rule")),
            },
            "elements" => {
                let element = single(elements_of(frame)?)?;
                match self.frames.last_mut() {
                    Some(Frame::Rule {
                        element: ref mut slot,
                        ..
                    }) => {
                        *slot = Some(element);
                        Ok(())
                    }
                    _ => Err(internal("elements outside of a rule")),
                }
            }
            "alternation" => {
                let mut elements = elements_of(frame)?;
                let element = if elements.len() == 1 {
                    elements.remove(0)
                } else {
                    Element::alternation(elements)?
                };
                self.push(element)
            }
            "concatenation" => {
                let mut elements = elements_of(frame)?;
                let element = if elements.len() == 1 {
                    elements.remove(0)
                } else {
                    Element::concatenation(elements)?
                };
                self.push(element)
            }
            "repetition" => match frame {
                Some(Frame::Repetition { count, elements }) => {
                    let element = single(elements)?;
                    let element = match count {
                        Some((min, max)) => Element::repetition(min, max, element)?,
                        None => element,
                    };
                    self.push(element)
                }
                _ => Err(internal("repetition without a frame")),
            },
            "repeat" => {
                let repeat = parse_repeat(text)?;
                match self.frames.last_mut() {
                    Some(Frame::Repetition { ref mut count, .. }) => {
                        *count = Some(repeat);
                        Ok(())
                    }
                    _ => Err(internal("repeat outside of a repetition")),
                }
            }
            "option" => {
                let element = single(elements_of(frame)?)?;
                self.push(Element::optional(element))
            }
            "char-val" => self.push(char_val(text)?),
            "bin-val" => self.push(num_val(text, 2)?),
            "dec-val" => self.push(num_val(text, 10)?),
            "hex-val" => self.push(num_val(text, 16)?),
            "prose-val" => self.push(prose_val(text)?),
            _ => Ok(()),
        }
    }

    fn push(&mut self, element: Element) -> Result<(), CompileError> {
        match self.frames.last_mut() {
            Some(Frame::Elements(ref mut elements))
            | Some(Frame::Repetition {
                ref mut elements, ..
            }) => {
                elements.push(element);
                Ok(())
            }
            _ => Err(internal("element outside of an element list")),
        }
    }

    fn define(&mut self, name: String, incremental: bool, element: Element) -> Result<(), CompileError> {
        let existing = self.rules.iter().position(|rule| rule.name() == name);
        match (existing, incremental) {
            (Some(index), true) => {
                let merged = match self.rules[index].element().clone() {
                    Element::Alternation(mut elements) => {
                        elements.push(element);
                        Element::Alternation(elements)
                    }
                    old => Element::Alternation(vec![old, element]),
                };
                self.rules[index] = self.rules[index].with_element(merged);
                debug!("Extended rule {}", self.rules[index]);
                Ok(())
            }
            (None, true) => Err(CompileError::UndefinedIncremental(name)),
            (Some(_), false) => Err(CompileError::Redefinition(name)),
            (None, false) => {
                let rule = Rule::new(&name, element)?;
                debug!("Assembled rule {}", rule);
                self.rules.push(rule);
                Ok(())
            }
        }
    }
}

impl Listener for RuleAssembler {
    fn enter(&mut self, rule: &str, _input: &str, _start: usize) {
        match rule {
            "rule" => self.frames.push(Frame::Rule {
                name: None,
                incremental: false,
                element: None,
            }),
            "elements" | "alternation" | "concatenation" | "option" => {
                self.frames.push(Frame::Elements(vec![]))
            }
            "repetition" => self.frames.push(Frame::Repetition {
                count: None,
                elements: vec![],
            }),
            _ => {}
        }
    }

    fn exit(&mut self, rule: &str, input: &str, start: usize, end: Option<usize>) {
        let frame = match rule {
            "rule" | "elements" | "alternation" | "concatenation" | "option" | "repetition" => {
                self.frames.pop()
            }
            _ => None,
        };

        let end = match end {
            Some(end) => end,
            None => return,
        };
        self.furthest = cmp::max(self.furthest, end);
        if self.error.is_some() {
            return;
        }

        let res = match input.get(start..end) {
            Some(text) => self.assemble(rule, text, frame),
            None => Err(internal("match does not fall on character boundaries")),
        };
        if let Err(err) = res {
            trace!("Recording compile error from {}: {}", rule, err);
            self.error = Some(err);
        }
    }
}

fn internal(msg: &str) -> CompileError {
    CompileError::Internal(msg.to_string())
}

fn elements_of(frame: Option<Frame>) -> Result<Vec<Element>, CompileError> {
    match frame {
        Some(Frame::Elements(elements)) => Ok(elements),
        _ => Err(internal("missing element list")),
    }
}

fn single(mut elements: Vec<Element>) -> Result<Element, CompileError> {
    if elements.len() != 1 {
        return Err(CompileError::Internal(format!(
            "expected a single element, found {}",
            elements.len()
        )));
    }
    Ok(elements.remove(0))
}

/// True for `=/`. The whitespace around the operator may hold comments, which are skipped.
fn is_incremental(defined_as: &str) -> bool {
    let mut in_comment = false;
    let mut chars = defined_as.chars();
    while let Some(c) = chars.next() {
        match c {
            ';' => in_comment = true,
            '\n' => in_comment = false,
            '=' if !in_comment => return chars.next() == Some('/'),
            _ => {}
        }
    }
    false
}

fn parse_repeat(repeat: &str) -> Result<(usize, Option<usize>), CompileError> {
    match repeat.find('*') {
        Some(star) => {
            let min = parse_count(&repeat[..star])?.unwrap_or(0);
            let max = parse_count(&repeat[star + 1..])?;
            Ok((min, max))
        }
        None => match parse_count(repeat)? {
            Some(count) => Ok((count, Some(count))),
            None => Err(internal("empty repeat")),
        },
    }
}

fn parse_count(digits: &str) -> Result<Option<usize>, CompileError> {
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(count) => Ok(Some(count)),
        Err(_) => Err(CompileError::InvalidNumber(digits.to_string())),
    }
}

fn char_val(text: &str) -> Result<Element, CompileError> {
    let (sensitive, quoted) = if text.starts_with('%') {
        let sensitive = text.get(1..2).map_or(false, |c| c.eq_ignore_ascii_case("s"));
        (sensitive, text.get(2..).unwrap_or(""))
    } else {
        (false, text)
    };
    if quoted.len() < 2 {
        return Err(internal("unterminated quoted string"));
    }

    let mut elements: Vec<Element> = vec![];
    for c in quoted[1..quoted.len() - 1].chars() {
        let set = if !sensitive && c.is_ascii_alphabetic() {
            CharSet::of_char(c.to_ascii_lowercase())? | CharSet::of_char(c.to_ascii_uppercase())?
        } else {
            CharSet::of_char(c)?
        };
        elements.push(Element::terminal(set));
    }

    Ok(match elements.len() {
        0 => Element::empty(),
        1 => elements.remove(0),
        _ => Element::Concatenation(elements),
    })
}

/// Compiles a `bin-val`, `dec-val` or `hex-val`, including its radix letter.
fn num_val(text: &str, radix: u32) -> Result<Element, CompileError> {
    let digits = text.get(1..).unwrap_or("");
    if let Some(dash) = digits.find('-') {
        let first = code_point(&digits[..dash], radix)?;
        let last = code_point(&digits[dash + 1..], radix)?;
        if first > last {
            return Err(CompileError::InvalidRange(text.to_string()));
        }
        return Ok(Element::terminal(CharSet::of_range(first, last)));
    }

    let mut elements: Vec<Element> = vec![];
    for value in digits.split('.') {
        elements.push(Element::terminal(CharSet::of_char(code_point(value, radix)?)?));
    }
    Ok(if elements.len() == 1 {
        elements.remove(0)
    } else {
        Element::Concatenation(elements)
    })
}

fn code_point(digits: &str, radix: u32) -> Result<char, CompileError> {
    let invalid = || CompileError::InvalidNumber(digits.to_string());
    let value = u32::from_str_radix(digits, radix).map_err(|_| invalid())?;
    let c = std::char::from_u32(value).ok_or_else(invalid)?;
    CharSet::of_char(c)?;
    Ok(c)
}

fn prose_val(text: &str) -> Result<Element, CompileError> {
    if text.len() < 2 {
        return Err(internal("unterminated prose value"));
    }
    Ok(Element::rule_name(text[1..text.len() - 1].trim())?)
}

/// One-based line and column of `index`, counting columns in bytes.
pub fn position(text: &str, index: usize) -> (usize, usize) {
    let before = &text.as_bytes()[..cmp::min(index, text.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1);
    (line, index - line_start + 1)
}
