//! Line-oriented fact vocabulary.
//!
//! The vocabulary is exchanged with external logic solvers and table tools.
//! Each fact kind is a variant of [`Fact`]; the exact token shapes are:
//!
//! | Fact | Meaning |
//! |---|---|
//! | `holds(State, (Predicate, Arg1, ..., ArgN)).` | proposition true in state |
//! | `holds(State, (Predicate, Arg1, Arg2), Role).` | role-tagged relation reported by a solver |
//! | `transition(StateA, StateB).` | directed edge |
//! | `init(State).` | designated initial state |
//! | `goal(State).` | state is a goal |
//! | `goal_object(Name).` | object referenced by a goal condition |
//! | `v_star(State, Distance).` | goal-distance label |
//! | `max_v_star(MaxDistance).` | maximum assigned distance |
//!
//! States and predicate names are written as quoted strings, object arguments
//! are written bare whenever they are valid lowercase identifiers or
//! integers and quoted otherwise.
use std::fmt;

use strum::{EnumDiscriminants, EnumIs, EnumIter, IntoStaticStr};

use crate::identity::Proposition;

mod answer;
mod parser;
mod space;
mod writer;

pub use answer::{answer_block, last_answer, reshape_role_holds, split_atoms};
pub use parser::{ParsedFacts, parse_facts, parse_facts_lenient};
pub use space::FactSpace;
pub use writer::FactWriter;

/// A single record of the fact vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(FactKind))]
#[strum_discriminants(derive(EnumIter, IntoStaticStr, Hash))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum Fact {
    Holds {
        state: String,
        atom: Proposition,
    },
    RoleHolds {
        state: String,
        atom: Proposition,
        role: String,
    },
    Transition {
        from: String,
        to: String,
    },
    Init(String),
    Goal(String),
    GoalObject(String),
    VStar {
        state: String,
        distance: usize,
    },
    MaxVStar(usize),
}

impl Fact {
    pub fn kind(&self) -> FactKind {
        self.into()
    }

    /// State the fact is about, if any.
    pub fn state(&self) -> Option<&str> {
        match self {
            Fact::Holds { state, .. }
            | Fact::RoleHolds { state, .. }
            | Fact::VStar { state, .. }
            | Fact::Init(state)
            | Fact::Goal(state) => Some(state),
            Fact::Transition { from, .. } => Some(from),
            Fact::GoalObject(_) | Fact::MaxVStar(_) => None,
        }
    }
}

/// Whether `s` can be written without quotes.
fn is_bare_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        // Canonical integers only, so reading the fact back yields the same text.
        Some('0') => chars.next().is_none(),
        Some(c) if c.is_ascii_digit() => s.len() <= 18 && chars.all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.chars() {
            match c {
                '"' => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                '\n' => write!(f, "\\n")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "\"")
    }
}

struct Symbol<'a>(&'a str);

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_bare_symbol(self.0) {
            write!(f, "{}", self.0)
        } else {
            write!(f, "{}", Quoted(self.0))
        }
    }
}

struct Atom<'a>(&'a Proposition);

impl fmt::Display for Atom<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", Quoted(&self.0.predicate))?;
        if self.0.args.is_empty() {
            return write!(f, ",)");
        }
        for arg in &self.0.args {
            write!(f, ", {}", Symbol(arg))?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Holds { state, atom } => {
                write!(f, "holds({}, {}).", Quoted(state), Atom(atom))
            }
            Fact::RoleHolds { state, atom, role } => write!(
                f,
                "holds({}, {}, {}).",
                Quoted(state),
                Atom(atom),
                Symbol(role)
            ),
            Fact::Transition { from, to } => {
                write!(f, "transition({}, {}).", Quoted(from), Quoted(to))
            }
            Fact::Init(state) => write!(f, "init({}).", Quoted(state)),
            Fact::Goal(state) => write!(f, "goal({}).", Quoted(state)),
            Fact::GoalObject(name) => write!(f, "goal_object({}).", Symbol(name)),
            Fact::VStar { state, distance } => {
                write!(f, "v_star({}, {}).", Quoted(state), distance)
            }
            Fact::MaxVStar(distance) => write!(f, "max_v_star({}).", distance),
        }
    }
}
