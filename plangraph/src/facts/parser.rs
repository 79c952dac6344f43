use chumsky::prelude::*;
use log::debug;

use crate::{
    facts::Fact,
    identity::Proposition,
    utils::error::{Error, FactParseError, PgResult},
};

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Generic term of the solver language, before it is matched against the
/// fact vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Str(String),
    Sym(String),
    Int(i64),
    Tuple(Vec<Term>),
    Compound { functor: String, args: Vec<Term> },
}

impl Term {
    /// Textual value of a constant.
    fn name(&self) -> Option<String> {
        match self {
            Term::Str(s) | Term::Sym(s) => Some(s.clone()),
            Term::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    fn natural(&self) -> Option<usize> {
        match self {
            Term::Int(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Interpret the term as a ground proposition. Accepts the tuple form
    /// `("on", a, b)`, the compound form `on(a, b)` and bare nullary names.
    fn atom(&self) -> Option<Proposition> {
        match self {
            Term::Tuple(items) => {
                let (head, rest) = items.split_first()?;
                let args = rest.iter().map(Term::name).collect::<Option<Vec<_>>>()?;
                Some(Proposition::new(head.name()?, args))
            }
            Term::Compound { functor, args } => {
                let args = args.iter().map(Term::name).collect::<Option<Vec<_>>>()?;
                Some(Proposition::new(functor.clone(), args))
            }
            Term::Str(name) | Term::Sym(name) => Some(Proposition::nullary(name.clone())),
            Term::Int(_) => None,
        }
    }

    /// Match a top-level term against the fact vocabulary.
    fn into_fact(self) -> Option<Fact> {
        let Term::Compound { functor, args } = self else {
            return None;
        };

        match (functor.as_str(), args.as_slice()) {
            ("holds", [state, atom]) => Some(Fact::Holds {
                state: state.name()?,
                atom: atom.atom()?,
            }),
            ("holds", [state, atom, role]) => Some(Fact::RoleHolds {
                state: state.name()?,
                atom: atom.atom()?,
                role: role.name()?,
            }),
            ("transition", [from, to]) => Some(Fact::Transition {
                from: from.name()?,
                to: to.name()?,
            }),
            ("init", [state]) => Some(Fact::Init(state.name()?)),
            ("goal", [state]) => Some(Fact::Goal(state.name()?)),
            ("goal_object", [name]) => Some(Fact::GoalObject(name.name()?)),
            ("v_star", [state, distance]) => Some(Fact::VStar {
                state: state.name()?,
                distance: distance.natural()?,
            }),
            ("max_v_star", [distance]) => Some(Fact::MaxVStar(distance.natural()?)),
            _ => None,
        }
    }
}

/// Whitespace and `%` line comments.
fn skip_parser<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    let comment = just('%').then(none_of("\r\n").repeated()).ignored();
    let blank = any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored();

    choice((comment, blank)).repeated().ignored()
}

fn quoted_parser<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
    )));

    none_of("\\\"")
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .labelled("string")
}

fn integer_parser<'src>() -> impl Parser<'src, &'src str, i64, Extra<'src>> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<i64>()
                .map_err(|e| Rich::custom(span, format!("invalid integer `{}`: {}", digits, e)))
        })
        .labelled("integer")
}

fn term_parser<'src>() -> impl Parser<'src, &'src str, Term, Extra<'src>> + Clone {
    recursive(|term| {
        let arguments = term
            .padded()
            .separated_by(just(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just('(').padded(), just(')').padded())
            .labelled("arguments");

        let compound = text::ident()
            .then(arguments.clone().or_not())
            .map(|(name, args): (&str, Option<Vec<Term>>)| match args {
                Some(args) => Term::Compound {
                    functor: name.to_string(),
                    args,
                },
                None => Term::Sym(name.to_string()),
            });

        choice((
            quoted_parser().map(Term::Str),
            integer_parser().map(Term::Int),
            compound,
            arguments.map(Term::Tuple),
        ))
        .labelled("term")
    })
}

/// A document is a sequence of terms, each optionally closed by `.`.
fn document_parser<'src>()
-> impl Parser<'src, &'src str, Vec<(Term, SimpleSpan)>, Extra<'src>> + Clone {
    let statement = term_parser()
        .map_with(|term, extra| (term, extra.span()))
        .then_ignore(skip_parser())
        .then_ignore(just('.').or_not())
        .then_ignore(skip_parser());

    skip_parser()
        .ignore_then(statement.repeated().collect::<Vec<_>>())
        .then_ignore(end())
}

/// Facts read from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFacts {
    pub facts: Vec<Fact>,
    /// Terms (strict mode) or lines (lenient mode) that were not facts of the
    /// vocabulary.
    pub skipped: usize,
}

fn collect_facts(terms: Vec<(Term, SimpleSpan)>, parsed: &mut ParsedFacts) {
    for (term, span) in terms {
        match term.into_fact() {
            Some(fact) => parsed.facts.push(fact),
            None => {
                debug!(
                    "ignoring term outside of the fact vocabulary at {}..{}",
                    span.start, span.end
                );
                parsed.skipped += 1;
            }
        }
    }
}

/// Parse a whole document.
///
/// Any grammar error fails the parse and is reported with its byte span.
/// Well-formed terms that do not belong to the vocabulary (unknown functor or
/// arity) are counted in [`ParsedFacts::skipped`].
pub fn parse_facts(src: &str) -> PgResult<ParsedFacts> {
    let terms = document_parser()
        .parse(src)
        .into_result()
        .map_err(|errors| Error::ParserErrors {
            errors: errors
                .into_iter()
                .map(|error| {
                    let span = error.span();
                    FactParseError {
                        message: error.to_string(),
                        span: span.start..span.end,
                    }
                })
                .collect(),
        })?;

    let mut parsed = ParsedFacts::default();
    collect_facts(terms, &mut parsed);
    Ok(parsed)
}

/// Parse a document line by line, skipping lines that do not match the
/// grammar instead of failing.
pub fn parse_facts_lenient(src: &str) -> ParsedFacts {
    let parser = document_parser();
    let mut parsed = ParsedFacts::default();

    for (number, line) in src.lines().enumerate() {
        match parser.parse(line).into_result() {
            Ok(terms) => collect_facts(terms, &mut parsed),
            Err(_) => {
                debug!("skipping malformed line {}: {}", number + 1, line.trim());
                parsed.skipped += 1;
            }
        }
    }

    parsed
}
