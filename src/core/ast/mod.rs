use {
    crate::core::charset::CharSet,
    std::{error, fmt},
};

pub mod core_rules;

lazy_static! {
    static ref NAME_CHARS: CharSet = CharSet::of_range('A', 'Z')
        | CharSet::of_range('a', 'z')
        | CharSet::of_range('0', '9')
        | CharSet::of_range('-', '-');
}

/// A grammar element. Recursion between rules only ever goes through `RuleName`, which
/// is resolved by name at generation time, so every element tree is finite.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Element {
    RuleName(String),
    /// Matches one character from the set; the empty set matches the empty string.
    Terminal(CharSet),
    /// `max` of `None` is unbounded.
    Repetition {
        min: usize,
        max: Option<usize>,
        element: Box<Element>,
    },
    Concatenation(Vec<Element>),
    Alternation(Vec<Element>),
}

impl Element {
    pub fn rule_name(name: &str) -> Result<Element, AstError> {
        validate_name(name)?;
        Ok(Element::RuleName(name.to_string()))
    }

    pub fn terminal(set: CharSet) -> Element {
        Element::Terminal(set)
    }

    pub fn empty() -> Element {
        Element::Terminal(CharSet::empty())
    }

    pub fn repetition(
        min: usize,
        max: Option<usize>,
        element: Element,
    ) -> Result<Element, AstError> {
        if let Some(max) = max {
            if min > max {
                return Err(AstError::InvalidRepetition(min, max));
            }
        }
        Ok(Element::Repetition {
            min,
            max,
            element: Box::new(element),
        })
    }

    pub fn optional(element: Element) -> Element {
        Element::Repetition {
            min: 0,
            max: Some(1),
            element: Box::new(element),
        }
    }

    pub fn concatenation(elements: Vec<Element>) -> Result<Element, AstError> {
        if elements.len() < 2 {
            return Err(AstError::TooFewElements("concatenation", elements.len()));
        }
        Ok(Element::Concatenation(elements))
    }

    pub fn alternation(elements: Vec<Element>) -> Result<Element, AstError> {
        if elements.len() < 2 {
            return Err(AstError::TooFewElements("alternation", elements.len()));
        }
        Ok(Element::Alternation(elements))
    }

    /// Checks every invariant of the tree, for elements built without the checked
    /// constructors.
    pub fn validate(&self) -> Result<(), AstError> {
        match self {
            Element::RuleName(name) => validate_name(name),
            Element::Terminal(_) => Ok(()),
            Element::Repetition { min, max, element } => {
                if let Some(max) = *max {
                    if *min > max {
                        return Err(AstError::InvalidRepetition(*min, max));
                    }
                }
                element.validate()
            }
            Element::Concatenation(elements) | Element::Alternation(elements) => {
                if elements.len() < 2 {
                    let kind = match self {
                        Element::Concatenation(_) => "concatenation",
                        _ => "alternation",
                    };
                    return Err(AstError::TooFewElements(kind, elements.len()));
                }
                elements.iter().try_for_each(|element| element.validate())
            }
        }
    }

    fn needs_group(&self) -> bool {
        match self {
            Element::Concatenation(_) | Element::Alternation(_) | Element::Repetition { .. } => {
                true
            }
            Element::Terminal(set) => set.len() > 1 && !is_single_range(set),
            Element::RuleName(_) => false,
        }
    }
}

fn is_single_range(set: &CharSet) -> bool {
    let mut bytes = set.bytes();
    match bytes.next() {
        None => true,
        Some(first) => {
            let last = first as u32 + set.len() - 1;
            last < 128 && set == &CharSet::of_range(first as char, last as u8 as char)
        }
    }
}

impl fmt::Display for Element {
    /// Renders the element in ABNF notation. Terminals are always written as `%x` values,
    /// so the output is exact regardless of case sensitivity.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Element::RuleName(name) => write!(f, "{}", name),
            Element::Terminal(set) => write_terminal(set, f),
            Element::Repetition { min, max, element } => {
                let body = if element.needs_group() {
                    format!("({})", element)
                } else {
                    element.to_string()
                };
                match (*min, *max) {
                    (0, Some(1)) => write!(f, "[{}]", element),
                    (min, Some(max)) if min == max => write!(f, "{}{}", min, body),
                    (0, None) => write!(f, "*{}", body),
                    (min, None) => write!(f, "{}*{}", min, body),
                    (0, Some(max)) => write!(f, "*{}{}", max, body),
                    (min, Some(max)) => write!(f, "{}*{}{}", min, max, body),
                }
            }
            Element::Concatenation(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    if i != 0 {
                        write!(f, " ")?;
                    }
                    match element {
                        Element::Alternation(_) => write!(f, "({})", element)?,
                        Element::Terminal(set) if !is_single_range(set) => {
                            write!(f, "({})", element)?
                        }
                        _ => write!(f, "{}", element)?,
                    }
                }
                Ok(())
            }
            Element::Alternation(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    if i != 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", element)?;
                }
                Ok(())
            }
        }
    }
}

fn write_terminal(set: &CharSet, f: &mut fmt::Formatter) -> fmt::Result {
    let mut ranges: Vec<(u8, u8)> = Vec::new();
    for b in set.bytes() {
        match ranges.last_mut() {
            Some(range) if range.1 + 1 == b => range.1 = b,
            _ => ranges.push((b, b)),
        }
    }

    if ranges.is_empty() {
        return write!(f, "\"\"");
    }

    for (i, (first, last)) in ranges.iter().enumerate() {
        if i != 0 {
            write!(f, " / ")?;
        }
        if first == last {
            write!(f, "%x{:02X}", first)?;
        } else {
            write!(f, "%x{:02X}-{:02X}", first, last)?;
        }
    }
    Ok(())
}

/// A named grammar rule. Names are unique within a compiled grammar.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Rule {
    name: String,
    element: Element,
}

impl Rule {
    pub fn new(name: &str, element: Element) -> Result<Rule, AstError> {
        validate_name(name)?;
        Ok(Rule {
            name: name.to_string(),
            element,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn into_element(self) -> Element {
        self.element
    }

    pub fn with_element(&self, element: Element) -> Rule {
        Rule {
            name: self.name.clone(),
            element,
        }
    }

    pub fn validate(&self) -> Result<(), AstError> {
        validate_name(&self.name)?;
        self.element.validate()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.element)
    }
}

pub fn validate_name(name: &str) -> Result<(), AstError> {
    if name.is_empty() {
        return Err(AstError::EmptyRuleName);
    }
    if name.chars().any(|c| !NAME_CHARS.contains(c)) {
        return Err(AstError::InvalidRuleName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AstError {
    EmptyRuleName,
    InvalidRuleName(String),
    InvalidRepetition(usize, usize),
    TooFewElements(&'static str, usize),
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AstError::EmptyRuleName => write!(f, "Rule name is empty"),
            AstError::InvalidRuleName(ref name) => {
                write!(f, "Illegal character in rule name \"{}\"", name)
            }
            AstError::InvalidRepetition(min, max) => write!(
                f,
                "Repetition minimum {} exceeds its maximum {}",
                min, max
            ),
            AstError::TooFewElements(kind, count) => {
                write!(f, "An {} needs at least 2 elements, found {}", kind, count)
            }
        }
    }
}

impl error::Error for AstError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// Unchecked shorthands for the grammars declared as static data in this crate.
pub(crate) mod build {
    use super::{Element, Rule};
    use crate::core::charset::CharSet;

    pub fn rule(name: &str, element: Element) -> Rule {
        Rule {
            name: name.to_string(),
            element,
        }
    }

    pub fn name(name: &str) -> Element {
        Element::RuleName(name.to_string())
    }

    pub fn chars(chars: &str) -> Element {
        Element::Terminal(
            chars
                .chars()
                .fold(CharSet::empty(), |set, c| set | CharSet::of_range(c, c)),
        )
    }

    pub fn range(first: char, last: char) -> Element {
        Element::Terminal(CharSet::of_range(first, last))
    }

    pub fn any(element: Element) -> Element {
        repeat(0, None, element)
    }

    pub fn at_least(min: usize, element: Element) -> Element {
        repeat(min, None, element)
    }

    pub fn optional(element: Element) -> Element {
        repeat(0, Some(1), element)
    }

    pub fn repeat(min: usize, max: Option<usize>, element: Element) -> Element {
        Element::Repetition {
            min,
            max,
            element: Box::new(element),
        }
    }

    pub fn seq(elements: Vec<Element>) -> Element {
        Element::Concatenation(elements)
    }

    pub fn alt(elements: Vec<Element>) -> Element {
        Element::Alternation(elements)
    }
}
