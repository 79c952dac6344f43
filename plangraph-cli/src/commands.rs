//! Subcommand implementations. Each one renders its complete output into a
//! buffer so nothing is written when a later step fails.
use std::{
    collections::BTreeMap,
    fs,
    io::{self, Read, Write},
    path::Path,
};

use log::{debug, info, warn};
use plangraph::{
    distance::goal_distances,
    facts::{
        Fact, FactKind, FactSpace, FactWriter, answer_block, last_answer, parse_facts,
        parse_facts_lenient, reshape_role_holds, split_atoms,
    },
};
use planroles::{ClosureOptions, RoleCatalog, StateRelations, derive_all, write_derived};
use strum::IntoEnumIterator;

use crate::error::{CliError, CliResult};

/// Path argument meaning standard input or output.
pub const STDIO: &str = "-";

pub fn read_input(path: &str) -> CliResult<String> {
    let read_error = |source| CliError::Read {
        path: path.to_string(),
        source,
    };

    if path == STDIO {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(read_error)?;
        Ok(text)
    } else {
        fs::read_to_string(path).map_err(read_error)
    }
}

/// Write `bytes` to `path`, or to stdout when no path (or `-`) is given.
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> CliResult<()> {
    match path.filter(|p| p.as_os_str() != STDIO) {
        Some(path) => fs::write(path, bytes).map_err(|source| CliError::Write {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|_| stdout.flush())
                .map_err(|source| CliError::Write {
                    path: STDIO.to_string(),
                    source,
                })
        }
    }
}

/// Problem name used for state tokens, taken from the input file stem.
fn problem_name(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string())
}

fn parse_document(file: &str, text: &str, lenient: bool) -> CliResult<Vec<Fact>> {
    let parsed = if lenient {
        parse_facts_lenient(text)
    } else {
        parse_facts(text).map_err(|error| match error {
            plangraph::Error::ParserErrors { errors } => CliError::Parse {
                file: file.to_string(),
                text: text.to_string(),
                errors,
            },
            other => other.into(),
        })?
    };

    if parsed.skipped > 0 {
        warn!("{}: {} entries outside of the fact vocabulary skipped", file, parsed.skipped);
    }
    debug!("{}: {} facts read", file, parsed.facts.len());
    Ok(parsed.facts)
}

/// Rewrite a state-space document with `v_star/2` and `max_v_star/1` labels.
pub fn distance(file: &str, text: &str, lenient: bool) -> CliResult<Vec<u8>> {
    let space = FactSpace::from_facts(parse_document(file, text, lenient)?);
    if space.graph.goal_count() == 0 {
        warn!("{}: no goal state, no state will be labeled", file);
    }

    let distances = goal_distances(&space.graph);
    info!(
        "{} of {} states labeled, max distance {}",
        distances.len(),
        space.graph.state_count(),
        distances.max_distance()
    );

    let mut writer = FactWriter::new(Vec::new(), &problem_name(file));
    writer.write_fact_space(&space, Some(&distances))?;
    Ok(writer.finish()?)
}

/// Discover roles over the binary predicates of a state-space document and
/// write their per-state values.
pub fn roles(file: &str, text: &str, options: &ClosureOptions) -> CliResult<Vec<u8>> {
    let space = FactSpace::from_facts(parse_document(file, text, false)?);
    let relations = StateRelations::from_fact_space(&space);

    let catalog = RoleCatalog::discover(relations.global(), options);
    if catalog.status().is_truncated() {
        warn!(
            "role discovery stopped at {} definitions, derived relations are incomplete",
            catalog.len()
        );
    }
    for &id in catalog.sorted_ids() {
        debug!("{}", catalog.expression(id));
    }

    let derived = derive_all(&catalog, &relations);
    let mut writer = FactWriter::new(Vec::new(), &problem_name(file));
    let count = write_derived(&mut writer, relations.universe(), &derived, |state: &String| {
        state.clone()
    })?;
    info!(
        "{} roles over {} objects, {} derived facts",
        catalog.len(),
        relations.universe().len(),
        count
    );
    Ok(writer.finish()?)
}

/// Extract the final answer set of a solver run as facts.
pub fn answer(file: &str, text: &str, block: bool, reshape_roles: bool) -> CliResult<Vec<u8>> {
    let atoms = if block {
        answer_block(text)
    } else {
        last_answer(text).map(str::to_string)
    }
    .ok_or_else(|| CliError::NoAnswer(file.to_string()))?;

    // One atom per line, so a malformed atom only loses itself.
    let parsed = parse_facts_lenient(&split_atoms(&atoms).join("\n"));
    if parsed.skipped > 0 {
        warn!("{}: {} atoms outside of the fact vocabulary skipped", file, parsed.skipped);
    }

    let facts = if reshape_roles {
        reshape_role_holds(parsed.facts)
    } else {
        parsed.facts
    };

    let mut writer = FactWriter::new(Vec::new(), &problem_name(file));
    writer.write_facts(&facts)?;
    Ok(writer.finish()?)
}

/// Summary of a fact document, one `key: value` per line.
pub fn stats(file: &str, text: &str) -> CliResult<String> {
    let facts = parse_document(file, text, false)?;

    let mut kinds: BTreeMap<&'static str, usize> =
        FactKind::iter().map(|kind| (kind.into(), 0)).collect();
    for fact in &facts {
        *kinds.entry(fact.kind().into()).or_default() += 1;
    }

    let space = FactSpace::from_facts(facts);
    let mut lines = vec![
        format!("states: {}", space.graph.state_count()),
        format!("transitions: {}", space.graph.transition_count()),
        format!("goals: {}", space.graph.goal_count()),
        format!(
            "initial: {}",
            space.graph.initial().map(String::as_str).unwrap_or("none")
        ),
    ];
    lines.extend(kinds.iter().map(|(kind, count)| format!("{kind}: {count}")));
    Ok(lines.join("\n") + "\n")
}
