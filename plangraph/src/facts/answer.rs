//! Extraction of answer sets from solver output.
use crate::{facts::Fact, identity::Proposition};

/// Atoms of the last answer set in clingo's default text output.
///
/// Every `Answer: N` header is followed by a single line of space-separated
/// atoms; with optimization the last answer is the best one.
pub fn last_answer(output: &str) -> Option<&str> {
    let mut last = None;
    let mut expecting_atoms = false;

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("Answer") {
            expecting_atoms = true;
        } else if expecting_atoms {
            last = Some(line);
            expecting_atoms = false;
        }
    }

    last
}

/// Lines of the block following an `ANSWER` header, up to the next `%` line.
///
/// This is the shape of clingo's `--outf=1` output.
pub fn answer_block(output: &str) -> Option<String> {
    let mut lines = output.lines().map(str::trim);
    lines.find(|line| *line == "ANSWER")?;

    let atoms: Vec<&str> = lines
        .take_while(|line| !line.starts_with('%'))
        .filter(|line| !line.is_empty())
        .collect();
    Some(atoms.join(" "))
}

/// Split an atoms line into its top-level terms.
///
/// Whitespace inside parentheses or quoted strings does not separate terms,
/// so `holds("a b", (on, x, y)) goal(s)` yields two terms.
pub fn split_atoms(line: &str) -> Vec<&str> {
    let mut atoms = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = None;

    for (index, c) in line.char_indices() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            c if c.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    atoms.push(&line[begin..index]);
                }
                continue;
            }
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        start.get_or_insert(index);
    }

    if let Some(begin) = start {
        atoms.push(&line[begin..]);
    }
    atoms
}

/// Rewrite role-tagged relations `holds(S, (R, a, b), role)` into plain
/// relations `holds(S, ("R_role", a, b))`. Other facts are kept unchanged.
pub fn reshape_role_holds(facts: impl IntoIterator<Item = Fact>) -> Vec<Fact> {
    facts
        .into_iter()
        .map(|fact| match fact {
            Fact::RoleHolds { state, atom, role } => Fact::Holds {
                state,
                atom: Proposition {
                    predicate: format!("{}_{}", atom.predicate, role),
                    args: atom.args,
                },
            },
            fact => fact,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLINGO_TEXT: &str = "clingo version 5.7.1\nReading from model.lp\nSolving...\nAnswer: 1\nholds(\"s\",(\"on\",a,b),r1)\nOptimization: 4\nAnswer: 2\nholds(\"s\",(\"on\",a,b),r2) goal(\"s\")\nOptimization: 2\nOPTIMUM FOUND\n";

    #[test]
    fn last_answer_line_is_selected() {
        assert_eq!(
            last_answer(CLINGO_TEXT),
            Some("holds(\"s\",(\"on\",a,b),r2) goal(\"s\")")
        );
        assert_eq!(last_answer("UNSATISFIABLE\n"), None);
    }

    #[test]
    fn answer_block_stops_at_comment() {
        let output = "% header\nANSWER\nholds(\"s\",(\"on\",a,b),tc).\n\ngoal(\"s\").\n% footer\nignored(1).\n";
        assert_eq!(
            answer_block(output).as_deref(),
            Some("holds(\"s\",(\"on\",a,b),tc). goal(\"s\").")
        );
        assert_eq!(answer_block("no answer here"), None);
    }

    #[test]
    fn atoms_split_at_top_level_whitespace() {
        assert_eq!(
            split_atoms(r#"holds("a b", ("on", x, y))  goal("s\" t") max_v_star(2)"#),
            vec![
                r#"holds("a b", ("on", x, y))"#,
                r#"goal("s\" t")"#,
                "max_v_star(2)"
            ]
        );
        assert!(split_atoms("   ").is_empty());
    }

    #[test]
    fn role_holds_become_plain_relations() {
        let facts = vec![
            Fact::RoleHolds {
                state: "s".into(),
                atom: Proposition::new("on", ["a", "b"]),
                role: "tc".into(),
            },
            Fact::Goal("s".into()),
        ];

        assert_eq!(
            reshape_role_holds(facts),
            vec![
                Fact::Holds {
                    state: "s".into(),
                    atom: Proposition::new("on_tc", ["a", "b"]),
                },
                Fact::Goal("s".into()),
            ]
        );
    }
}
