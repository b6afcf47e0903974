use {
    crate::core::ast::{Element, Rule},
    std::{
        collections::{HashMap, HashSet},
        error, fmt,
    },
};

/// The rules a grammar can refer to: its own rules, plus every core rule that none of
/// them shadows.
pub struct RuleUniverse<'r> {
    rules: HashMap<&'r str, &'r Rule>,
}

impl<'r> RuleUniverse<'r> {
    pub fn new(requested: &'r [Rule], core: &'r [Rule]) -> Self {
        let mut rules: HashMap<&'r str, &'r Rule> = HashMap::new();
        for rule in core {
            rules.insert(rule.name(), rule);
        }
        for rule in requested {
            rules.insert(rule.name(), rule);
        }
        RuleUniverse { rules }
    }

    pub fn get(&self, name: &str) -> Option<&'r Rule> {
        self.rules.get(name).cloned()
    }

    /// True if `rule` is the definition this universe resolves its name to.
    pub fn resolves_to(&self, rule: &Rule) -> bool {
        match self.rules.get(rule.name()) {
            Some(resolved) => std::ptr::eq(*resolved, rule),
            None => false,
        }
    }
}

/// Collects every rule name reachable from the elements of `requested`, following
/// references through `universe`. Each name is expanded once, so recursive grammars
/// terminate.
pub fn collect_references(
    requested: &[Rule],
    universe: &RuleUniverse,
) -> Result<HashSet<String>, ReferenceError> {
    let mut names: HashSet<String> = HashSet::new();
    for rule in requested {
        collect_element(rule.element(), rule.name(), universe, &mut names)?;
    }
    Ok(names)
}

fn collect_element(
    element: &Element,
    referrer: &str,
    universe: &RuleUniverse,
    names: &mut HashSet<String>,
) -> Result<(), ReferenceError> {
    match element {
        Element::RuleName(name) => {
            if names.contains(name) {
                return Ok(());
            }
            names.insert(name.clone());

            match universe.get(name) {
                Some(rule) => collect_element(rule.element(), rule.name(), universe, names),
                None => Err(ReferenceError::UndefinedRule {
                    name: name.clone(),
                    referrer: referrer.to_string(),
                }),
            }
        }
        Element::Terminal(_) => Ok(()),
        Element::Repetition { element, .. } => collect_element(element, referrer, universe, names),
        Element::Concatenation(elements) | Element::Alternation(elements) => {
            for element in elements {
                collect_element(element, referrer, universe, names)?;
            }
            Ok(())
        }
    }
}

/// Rejects any rule of `requested` that can reach a call to itself without consuming
/// input, since a recursive-descent parser for it would never return.
pub fn check_left_recursion(
    requested: &[Rule],
    universe: &RuleUniverse,
) -> Result<(), ReferenceError> {
    let nullable = nullable_rules(universe);
    for rule in requested {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&str> = vec![];
        leading_names(rule.element(), &nullable, &mut pending);

        while let Some(name) = pending.pop() {
            if name == rule.name() {
                return Err(ReferenceError::LeftRecursion(name.to_string()));
            }
            if !visited.insert(name) {
                continue;
            }
            if let Some(next) = universe.get(name) {
                leading_names(next.element(), &nullable, &mut pending);
            }
        }
    }
    Ok(())
}

/// Names of the rules in `universe` that can match the empty string.
fn nullable_rules<'r>(universe: &RuleUniverse<'r>) -> HashSet<&'r str> {
    let mut nullable: HashSet<&'r str> = HashSet::new();
    loop {
        let found = nullable.len();
        for (name, rule) in &universe.rules {
            if !nullable.contains(name) && is_nullable(rule.element(), &nullable) {
                nullable.insert(*name);
            }
        }
        if nullable.len() == found {
            return nullable;
        }
    }
}

fn is_nullable(element: &Element, nullable: &HashSet<&str>) -> bool {
    match element {
        Element::RuleName(name) => nullable.contains(name.as_str()),
        Element::Terminal(set) => set.is_empty(),
        Element::Repetition { min, element, .. } => *min == 0 || is_nullable(element, nullable),
        Element::Concatenation(elements) => {
            elements.iter().all(|element| is_nullable(element, nullable))
        }
        Element::Alternation(elements) => {
            elements.iter().any(|element| is_nullable(element, nullable))
        }
    }
}

/// Pushes the rules `element` may call before it consumes any input.
fn leading_names<'e>(element: &'e Element, nullable: &HashSet<&str>, names: &mut Vec<&'e str>) {
    match element {
        Element::RuleName(name) => names.push(name),
        Element::Terminal(_) => {}
        Element::Repetition { max: Some(0), .. } => {}
        Element::Repetition { element, .. } => leading_names(element, nullable, names),
        Element::Concatenation(elements) => {
            for element in elements {
                leading_names(element, nullable, names);
                if !is_nullable(element, nullable) {
                    break;
                }
            }
        }
        Element::Alternation(elements) => {
            for element in elements {
                leading_names(element, nullable, names);
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReferenceError {
    UndefinedRule { name: String, referrer: String },
    LeftRecursion(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReferenceError::UndefinedRule {
                ref name,
                ref referrer,
            } => write!(
                f,
                "Rule \"{}\" references undefined rule \"{}\"",
                referrer, name
            ),
            ReferenceError::LeftRecursion(ref name) => write!(
                f,
                "Rule \"{}\" can reach itself without consuming input",
                name
            ),
        }
    }
}

impl error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
