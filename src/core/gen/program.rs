use {
    crate::core::{
        ast::Rule,
        charset::CharTest,
        gen::{Backend, GenError, RoutineDecl, RoutineId},
    },
    std::collections::HashMap,
};

/// Observes the public routines of a parse. `enter` fires before a routine runs, `exit`
/// after it, with `end` of `None` if the routine did not match. Callbacks for routines
/// entered during a failed attempt still fire; the listener sees every attempt, not just
/// the ones that end up in the final parse.
pub trait Listener {
    fn enter(&mut self, _rule: &str, _input: &str, _start: usize) {}

    fn exit(&mut self, _rule: &str, _input: &str, _start: usize, _end: Option<usize>) {}
}

impl Listener for () {}

/// Executable form of an optimized element.
#[derive(Debug, Clone)]
pub enum Node {
    Empty,
    Terminal(CharTest),
    Call {
        routine: RoutineId,
        forward_listener: bool,
    },
    Sequence(Vec<Node>),
    Choice(Vec<Node>),
    Repeat {
        min: usize,
        max: Option<usize>,
        body: Box<Node>,
    },
}

#[derive(Debug)]
struct Routine {
    name: String,
    public: bool,
    body: Node,
}

/// An in-memory parser: one routine per generated rule, run by a recursive evaluator over
/// the input bytes. Immutable once built, so one program can serve many threads.
#[derive(Debug)]
pub struct Program {
    routines: Vec<Routine>,
    public: HashMap<String, RoutineId>,
}

impl Program {
    /// The entry point for the public routine `name`, if there is one.
    pub fn matcher(&self, name: &str) -> Option<Matcher> {
        self.public.get(name).map(|&routine| Matcher {
            program: self,
            routine,
        })
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.routines
            .iter()
            .filter(|routine| routine.public)
            .map(|routine| routine.name.as_str())
            .collect()
    }

    fn invoke(
        &self,
        id: RoutineId,
        input: &str,
        start: usize,
        listener: &mut dyn Listener,
    ) -> Option<usize> {
        let routine = &self.routines[id];
        if routine.public {
            listener.enter(&routine.name, input, start);
            let end = self.eval(&routine.body, input, start, listener);
            listener.exit(&routine.name, input, start, end);
            end
        } else {
            self.eval(&routine.body, input, start, &mut ())
        }
    }

    fn eval(
        &self,
        node: &Node,
        input: &str,
        index: usize,
        listener: &mut dyn Listener,
    ) -> Option<usize> {
        match node {
            Node::Empty => Some(index),
            Node::Terminal(test) => match input.as_bytes().get(index) {
                Some(&b) if test.test(b) => Some(index + 1),
                _ => None,
            },
            Node::Call {
                routine,
                forward_listener,
            } => {
                if *forward_listener {
                    self.invoke(*routine, input, index, listener)
                } else {
                    self.invoke(*routine, input, index, &mut ())
                }
            }
            Node::Sequence(nodes) => {
                let mut index = index;
                for node in nodes {
                    index = self.eval(node, input, index, listener)?;
                }
                Some(index)
            }
            Node::Choice(nodes) => {
                for node in nodes {
                    if let Some(end) = self.eval(node, input, index, listener) {
                        return Some(end);
                    }
                }
                None
            }
            Node::Repeat { min, max, body } => {
                let mut index = index;
                let mut count = 0;
                while max.map_or(true, |max| count < max) {
                    match self.eval(body, input, index, listener) {
                        // Zero width, so further iterations cannot progress.
                        Some(next) if next == index => {
                            count = count.max(*min);
                            break;
                        }
                        Some(next) => {
                            count += 1;
                            index = next;
                        }
                        None => break,
                    }
                }
                if count < *min {
                    None
                } else {
                    Some(index)
                }
            }
        }
    }
}

/// A public routine of a `Program`.
#[derive(Clone, Copy)]
pub struct Matcher<'p> {
    program: &'p Program,
    routine: RoutineId,
}

impl<'p> Matcher<'p> {
    pub fn name(&self) -> &'p str {
        &self.program.routines[self.routine].name
    }

    /// Matches the rule at `start`, returning the end index of the match. The match need
    /// not reach the end of the input.
    pub fn run(&self, input: &str, start: usize) -> Option<usize> {
        self.program.invoke(self.routine, input, start, &mut ())
    }

    pub fn run_traced(
        &self,
        input: &str,
        start: usize,
        listener: &mut dyn Listener,
    ) -> Option<usize> {
        self.program.invoke(self.routine, input, start, listener)
    }

    pub fn matches_fully(&self, input: &str) -> bool {
        self.run(input, 0) == Some(input.len())
    }
}

pub struct ProgramBackend {
    routines: Vec<Routine>,
}

impl ProgramBackend {
    pub fn new() -> Self {
        ProgramBackend { routines: vec![] }
    }
}

impl Default for ProgramBackend {
    fn default() -> Self {
        ProgramBackend::new()
    }
}

impl Backend for ProgramBackend {
    type Fragment = Node;
    type Output = Program;

    fn declare(&mut self, routines: &[RoutineDecl]) -> Result<(), GenError> {
        self.routines = routines
            .iter()
            .map(|decl| Routine {
                name: decl.name.clone(),
                public: decl.public,
                body: Node::Empty,
            })
            .collect();
        Ok(())
    }

    fn empty(&mut self) -> Node {
        Node::Empty
    }

    fn terminal(&mut self, test: CharTest) -> Node {
        Node::Terminal(test)
    }

    fn call(&mut self, target: RoutineId, forward_listener: bool) -> Node {
        Node::Call {
            routine: target,
            forward_listener,
        }
    }

    fn concatenation(&mut self, parts: Vec<Node>) -> Node {
        Node::Sequence(parts)
    }

    fn alternation(&mut self, parts: Vec<Node>) -> Node {
        Node::Choice(parts)
    }

    fn repetition(&mut self, min: usize, max: Option<usize>, body: Node) -> Node {
        Node::Repeat {
            min,
            max,
            body: Box::new(body),
        }
    }

    fn routine(&mut self, id: RoutineId, _rule: &Rule, body: Node) {
        self.routines[id].body = body;
    }

    fn finish(self) -> Program {
        let public = self
            .routines
            .iter()
            .enumerate()
            .filter(|(_, routine)| routine.public)
            .map(|(id, routine)| (routine.name.clone(), id))
            .collect();
        Program {
            routines: self.routines,
            public,
        }
    }
}
