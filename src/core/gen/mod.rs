use {
    crate::core::{
        ast::{core_rules::CORE_RULES, Element, Rule},
        charset::CharTest,
        optimize,
        reference::{self, ReferenceError, RuleUniverse},
    },
    std::{
        collections::{HashMap, HashSet},
        error, fmt,
    },
};

pub mod program;
pub mod rust;

pub use self::{
    program::{Listener, Matcher, Program, ProgramBackend},
    rust::RustBackend,
};

/// Index of a routine, in the order routines are declared to a backend.
pub type RoutineId = usize;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RoutineDecl {
    pub name: String,
    pub public: bool,
}

/// Target of the lowering. The generator walks each optimized rule and asks the backend
/// for one fragment per element; a backend turns fragments into whatever its target
/// needs, be it executable routines or source text.
pub trait Backend {
    type Fragment;
    type Output;

    fn declare(&mut self, routines: &[RoutineDecl]) -> Result<(), GenError>;

    /// Matches the empty string.
    fn empty(&mut self) -> Self::Fragment;

    /// Matches one character accepted by `test`.
    fn terminal(&mut self, test: CharTest) -> Self::Fragment;

    fn call(&mut self, target: RoutineId, forward_listener: bool) -> Self::Fragment;

    fn concatenation(&mut self, parts: Vec<Self::Fragment>) -> Self::Fragment;

    fn alternation(&mut self, parts: Vec<Self::Fragment>) -> Self::Fragment;

    fn repetition(
        &mut self,
        min: usize,
        max: Option<usize>,
        body: Self::Fragment,
    ) -> Self::Fragment;

    fn routine(&mut self, id: RoutineId, rule: &Rule, body: Self::Fragment);

    fn finish(self) -> Self::Output;
}

pub fn generate_program(rules: &[Rule]) -> Result<Program, GenError> {
    generate(rules, ProgramBackend::new())
}

pub fn generate_rust(name: &str, doc: Option<&str>, rules: &[Rule]) -> Result<String, GenError> {
    generate(rules, RustBackend::new(name, doc)?)
}

/// Validates `rules`, optimizes them and lowers them, together with the core rules they
/// end up referencing, through `backend`. The requested rules become public routines;
/// the core rules pulled in to support them are private.
pub fn generate<B: Backend>(rules: &[Rule], backend: B) -> Result<B::Output, GenError> {
    lower_rules(rules, backend, optimize::optimize_all)
}

fn lower_rules<B: Backend>(
    rules: &[Rule],
    mut backend: B,
    rewrite: fn(&[Rule]) -> Vec<Rule>,
) -> Result<B::Output, GenError> {
    check_duplicates(rules)?;

    let universe = RuleUniverse::new(rules, &CORE_RULES);
    reference::collect_references(rules, &universe)?;

    let optimized = rewrite(rules);
    let optimized_core = rewrite(&CORE_RULES);
    let optimized_universe = RuleUniverse::new(&optimized, &optimized_core);
    let referenced = reference::collect_references(&optimized, &optimized_universe)?;
    reference::check_left_recursion(&optimized, &optimized_universe)?;

    let mut routines: Vec<(&Rule, bool)> = optimized.iter().map(|rule| (rule, true)).collect();
    routines.extend(
        optimized_core
            .iter()
            .filter(|rule| referenced.contains(rule.name()))
            .filter(|rule| optimized_universe.resolves_to(rule))
            .map(|rule| (rule, false)),
    );

    debug!(
        "Generating {} routines ({} requested, {} core)",
        routines.len(),
        optimized.len(),
        routines.len() - optimized.len()
    );

    let decls: Vec<RoutineDecl> = routines
        .iter()
        .map(|(rule, public)| RoutineDecl {
            name: rule.name().to_string(),
            public: *public,
        })
        .collect();
    let ids: HashMap<&str, RoutineId> = decls
        .iter()
        .enumerate()
        .map(|(id, decl)| (decl.name.as_str(), id))
        .collect();

    backend.declare(&decls)?;

    for (id, (rule, public)) in routines.iter().enumerate() {
        trace!("Lowering {}", rule);
        let lowering = Lowering {
            rule: rule.name(),
            public: *public,
            ids: &ids,
            decls: &decls,
        };
        let body = lowering.lower(rule.element(), &mut backend)?;
        backend.routine(id, rule, body);
    }

    Ok(backend.finish())
}

fn check_duplicates(rules: &[Rule]) -> Result<(), GenError> {
    let mut names: HashSet<&str> = HashSet::new();
    for rule in rules {
        if !names.insert(rule.name()) {
            return Err(GenError::DuplicateRule(rule.name().to_string()));
        }
    }
    Ok(())
}

struct Lowering<'g> {
    rule: &'g str,
    public: bool,
    ids: &'g HashMap<&'g str, RoutineId>,
    decls: &'g [RoutineDecl],
}

impl<'g> Lowering<'g> {
    fn lower<B: Backend>(&self, element: &Element, backend: &mut B) -> Result<B::Fragment, GenError> {
        let fragment = match element {
            Element::RuleName(name) => {
                let target = match self.ids.get(name.as_str()) {
                    Some(target) => *target,
                    None => {
                        return Err(GenError::ReferenceErr(ReferenceError::UndefinedRule {
                            name: name.clone(),
                            referrer: self.rule.to_string(),
                        }))
                    }
                };
                backend.call(target, self.public && self.decls[target].public)
            }
            Element::Terminal(set) => {
                if set.is_empty() {
                    backend.empty()
                } else {
                    backend.terminal(set.match_expression())
                }
            }
            Element::Repetition { min, max, element } => {
                let body = self.lower(element, backend)?;
                backend.repetition(*min, *max, body)
            }
            Element::Concatenation(elements) => {
                let parts = self.lower_all(elements, backend)?;
                backend.concatenation(parts)
            }
            Element::Alternation(elements) => {
                let parts = self.lower_all(elements, backend)?;
                backend.alternation(parts)
            }
        };
        Ok(fragment)
    }

    fn lower_all<B: Backend>(
        &self,
        elements: &[Element],
        backend: &mut B,
    ) -> Result<Vec<B::Fragment>, GenError> {
        let mut parts = Vec::with_capacity(elements.len());
        for element in elements {
            parts.push(self.lower(element, backend)?);
        }
        Ok(parts)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum GenError {
    DuplicateRule(String),
    ReferenceErr(ReferenceError),
    InvalidIdentifier(String),
    IdentifierClash(String, String, String),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenError::DuplicateRule(ref name) => write!(f, "Duplicate rule name \"{}\"", name),
            GenError::ReferenceErr(ref err) => write!(f, "Reference error: {}", err),
            GenError::InvalidIdentifier(ref name) => {
                write!(f, "\"{}\" is not a valid Rust identifier", name)
            }
            GenError::IdentifierClash(ref first, ref second, ref ident) => write!(
                f,
                "Rules \"{}\" and \"{}\" both map to the identifier `{}`",
                first, second, ident
            ),
        }
    }
}

impl error::Error for GenError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            GenError::ReferenceErr(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReferenceError> for GenError {
    fn from(err: ReferenceError) -> GenError {
        GenError::ReferenceErr(err)
    }
}
