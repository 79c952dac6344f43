//! Content-addressed state identity.
//!
//! A state is fully described by its [`Valuation`], the set of ground
//! [`Proposition`]s true in it. The [`StateId`] of a state is a fixed-width
//! digest of the canonical (sorted) valuation, so equal valuations always map
//! to the same identifier regardless of construction order, allocation or the
//! process they were computed in.
//!
//! The textual rendering used in fact documents splits the digest into a sign
//! marker and a magnitude (see [`StateId::token`]); this is purely an output
//! concern and plays no role in equality.
use std::{
    collections::{BTreeSet, HashMap, hash_map::Entry},
    fmt,
};

use smallvec::SmallVec;
use strum::EnumIs;

use crate::{
    magic::{STATE_TOKEN_NEGATIVE, STATE_TOKEN_POSITIVE, STATE_TOKEN_PREFIX},
    utils::error::{Error, PgResult},
};

/// A ground proposition `(predicate, arg_1, ..., arg_n)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Proposition {
    pub predicate: String,
    pub args: SmallVec<String, 2>,
}

impl Proposition {
    pub fn new<S: Into<String>>(
        predicate: impl Into<String>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            predicate: predicate.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A proposition without arguments, such as `handempty`.
    pub fn nullary(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            args: SmallVec::new(),
        }
    }

    /// Number of object arguments.
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.join(", "))?;
        }
        Ok(())
    }
}

/// The set of ground propositions true in a state.
///
/// Propositions are kept sorted and deduplicated, which makes the valuation
/// its own canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Valuation(BTreeSet<Proposition>);

impl Valuation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a proposition. Returns `false` if it was already true.
    pub fn insert(&mut self, proposition: Proposition) -> bool {
        self.0.insert(proposition)
    }

    /// Remove a proposition. Returns `false` if it was not true.
    pub fn remove(&mut self, proposition: &Proposition) -> bool {
        self.0.remove(proposition)
    }

    pub fn contains(&self, proposition: &Proposition) -> bool {
        self.0.contains(proposition)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content digest of this valuation.
    pub fn id(&self) -> StateId {
        StateId::of(self)
    }
}

impl FromIterator<Proposition> for Valuation {
    fn from_iter<T: IntoIterator<Item = Proposition>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Proposition> for Valuation {
    fn extend<T: IntoIterator<Item = Proposition>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a Valuation {
    type Item = &'a Proposition;
    type IntoIter = std::collections::btree_set::Iter<'a, Proposition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, proposition) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", proposition)?;
        }
        write!(f, "}}")
    }
}

/// Stable identifier of a state, derived from the content of its valuation.
///
/// The identifier is the first 64 bits of a blake3 digest over a
/// length-prefixed encoding of the sorted propositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u64);

impl StateId {
    /// Compute the identifier of `valuation`.
    pub fn of(valuation: &Valuation) -> Self {
        fn update_str(hasher: &mut blake3::Hasher, s: &str) {
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(valuation.len() as u64).to_le_bytes());
        for proposition in valuation {
            update_str(&mut hasher, &proposition.predicate);
            hasher.update(&(proposition.args.len() as u64).to_le_bytes());
            for arg in &proposition.args {
                update_str(&mut hasher, arg);
            }
        }

        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        StateId(u64::from_le_bytes(head))
    }

    pub const fn from_raw(raw: u64) -> Self {
        StateId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The digest reinterpreted as a signed integer.
    pub const fn signed(self) -> i64 {
        self.0 as i64
    }

    /// Render the identifier as `s_<problem>_<p|m><magnitude>`.
    ///
    /// The problem name is sanitized with [`sanitize_problem_name`].
    pub fn token(self, problem: &str) -> String {
        format!(
            "{}_{}_{}",
            STATE_TOKEN_PREFIX,
            sanitize_problem_name(problem),
            self
        )
    }

    /// Parse a token produced by [`StateId::token`]. Surrounding double quotes
    /// are accepted.
    pub fn from_token(token: &str) -> PgResult<Self> {
        let malformed = || Error::MalformedStateToken(token.to_string());

        let bare = token
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(token);
        let rest = bare
            .strip_prefix(STATE_TOKEN_PREFIX)
            .and_then(|t| t.strip_prefix('_'))
            .ok_or_else(malformed)?;
        let (_, tail) = rest.rsplit_once('_').ok_or_else(malformed)?;

        let mut chars = tail.chars();
        let sign = chars.next().ok_or_else(malformed)?;
        let magnitude: u64 = chars.as_str().parse().map_err(|_| malformed())?;

        let signed: i64 = match sign {
            STATE_TOKEN_POSITIVE => i64::try_from(magnitude).map_err(|_| malformed())?,
            STATE_TOKEN_NEGATIVE if magnitude > 0 => {
                i64::try_from(-i128::from(magnitude)).map_err(|_| malformed())?
            }
            _ => return Err(malformed()),
        };

        Ok(StateId(signed as u64))
    }
}

impl fmt::Display for StateId {
    /// Sign marker followed by the magnitude, e.g. `p42` or `m42`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signed = self.signed();
        let sign = if signed >= 0 {
            STATE_TOKEN_POSITIVE
        } else {
            STATE_TOKEN_NEGATIVE
        };
        write!(f, "{}{}", sign, signed.unsigned_abs())
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with an underscore.
pub fn sanitize_problem_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Outcome of [`StateRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum Registration {
    /// The valuation was not known before.
    Fresh(StateId),
    /// An equal valuation had already been registered.
    Known(StateId),
}

impl Registration {
    pub fn id(self) -> StateId {
        match self {
            Registration::Fresh(id) | Registration::Known(id) => id,
        }
    }
}

/// Identity table of every state seen so far.
///
/// # About hash collisions
/// Identifiers are 64-bit digests, so two distinct valuations may in principle
/// share one. Every lookup that hits an existing identifier compares the stored
/// valuation with the incoming one; a mismatch is reported as
/// [`Error::IdentityCollision`] and the two states are never merged.
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
    valuations: HashMap<StateId, Valuation>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `valuation` under its content identifier.
    pub fn register(&mut self, valuation: Valuation) -> PgResult<Registration> {
        let id = StateId::of(&valuation);
        self.insert(id, valuation)
    }

    /// Register `valuation` under an explicit identifier.
    ///
    /// [`StateRegistry::register`] is the usual entry point; this exists for
    /// callers that already computed the identifier.
    pub fn insert(&mut self, id: StateId, valuation: Valuation) -> PgResult<Registration> {
        match self.valuations.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(valuation);
                Ok(Registration::Fresh(id))
            }
            Entry::Occupied(slot) if slot.get() == &valuation => Ok(Registration::Known(id)),
            Entry::Occupied(slot) => Err(Error::IdentityCollision {
                id,
                existing: slot.get().to_string(),
                incoming: valuation.to_string(),
            }),
        }
    }

    pub fn get(&self, id: StateId) -> Option<&Valuation> {
        self.valuations.get(&id)
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.valuations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.valuations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valuations.is_empty()
    }

    pub fn into_inner(self) -> HashMap<StateId, Valuation> {
        self.valuations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(a: &str, b: &str) -> Proposition {
        Proposition::new("on", [a, b])
    }

    #[test]
    fn identity_ignores_insertion_order() {
        let forward: Valuation = [on("a", "b"), on("b", "c"), Proposition::new("clear", ["a"])]
            .into_iter()
            .collect();
        let mut backward = Valuation::new();
        backward.insert(Proposition::new("clear", ["a"]));
        backward.insert(on("b", "c"));
        backward.insert(on("a", "b"));

        assert_eq!(forward, backward);
        assert_eq!(forward.id(), backward.id());
    }

    #[test]
    fn identity_separates_argument_boundaries() {
        let left: Valuation = [Proposition::new("p", ["ab", "c"])].into_iter().collect();
        let right: Valuation = [Proposition::new("p", ["a", "bc"])].into_iter().collect();
        assert_ne!(left.id(), right.id());
    }

    #[test]
    fn token_uses_sign_markers() {
        let positive = StateId::from_raw(42);
        assert_eq!(positive.token("blocks"), "s_blocks_p42");

        let negative = StateId::from_raw((-42i64) as u64);
        assert_eq!(negative.token("blocks"), "s_blocks_m42");

        let minimum = StateId::from_raw(i64::MIN as u64);
        assert_eq!(minimum.token("x"), format!("s_x_m{}", 1u64 << 63));
    }

    #[test]
    fn token_round_trips() {
        for raw in [0u64, 1, 42, i64::MAX as u64, i64::MIN as u64, u64::MAX] {
            let id = StateId::from_raw(raw);
            let token = id.token("prob_01");
            assert_eq!(StateId::from_token(&token).unwrap(), id, "token {token}");
            assert_eq!(StateId::from_token(&format!("\"{token}\"")).unwrap(), id);
        }
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let malformed = [
            "",
            "s_",
            "x_prob_p1",
            "s_prob_q1",
            "s_prob_m0",
            "s_prob_p-1",
            "s_prob_pabc",
        ];
        for token in malformed {
            assert!(
                StateId::from_token(token).is_err(),
                "token `{token}` should be rejected"
            );
        }
    }

    #[test]
    fn problem_names_are_sanitized() {
        assert_eq!(sanitize_problem_name("p-01.blocks"), "p_01_blocks");
        assert_eq!(StateId::from_raw(7).token("a b"), "s_a_b_p7");
    }

    #[test]
    fn registry_detects_collisions() {
        let mut registry = StateRegistry::new();
        let first: Valuation = [on("a", "b")].into_iter().collect();
        let second: Valuation = [on("b", "a")].into_iter().collect();

        let id = first.id();
        assert!(registry.insert(id, first.clone()).unwrap().is_fresh());
        assert!(registry.insert(id, first).unwrap().is_known());

        match registry.insert(id, second) {
            Err(Error::IdentityCollision { id: collided, .. }) => assert_eq!(collided, id),
            other => panic!("expected a collision, got {other:?}"),
        }
        assert_eq!(registry.len(), 1);
    }
}
