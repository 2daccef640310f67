//! Overload selection by best-match numeric distance.
//!
//! Given a call with argument types `A1…An`, the selected overload minimizes
//! the sum of per-parameter distances, where the distance from an actual
//! type to a formal type is 0 on structural identity, otherwise the minimum
//! hop count along the actual's superclass graph, otherwise infinite. Ties
//! are an error; there is no silent pick.

use ladon_source::types::Position;
use thiserror::Error;

use crate::decl::{DeclTable, FunctionId};
use crate::types::Type;

/// Errors produced by overload selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverloadError {
    /// Two or more candidates share the minimal total distance.
    #[error("ambiguous call: {} candidates match equally well", candidates.len())]
    Ambiguous {
        /// The equally ranked candidates
        candidates: Vec<FunctionId>,
        /// The location of the call
        position: Position,
    },

    /// No candidate accepts the argument types.
    #[error("no matching overload for the given argument types")]
    NoMatch {
        /// The location of the call
        position: Position,
    },
}

impl OverloadError {
    /// Returns the position associated with this error.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::Ambiguous { position, .. } | Self::NoMatch { position } => *position,
        }
    }
}

/// Computes the distance from `actual` to `formal`.
///
/// Returns 0 when the types match structurally, the superclass hop count
/// when `formal` is reachable from `actual`, and `None` otherwise.
#[must_use]
pub fn distance(table: &DeclTable, formal: &Type, actual: &Type) -> Option<u32> {
    if formal == actual {
        return Some(0);
    }

    let from = actual.class()?;
    let to = formal.class()?;
    let hops = table.superclass_distance(from, to)?;

    // Distinct variations of one template never match at distance zero.
    if hops == 0 {
        return None;
    }

    Some(hops)
}

/// Computes the total distance of one candidate against the argument types.
///
/// Returns `None` when the arity differs or any parameter is unreachable.
#[must_use]
pub fn candidate_distance(table: &DeclTable, candidate: FunctionId, args: &[Type]) -> Option<u32> {
    let decl = table.function(candidate);
    if decl.params.len() != args.len() {
        return None;
    }

    let mut total = 0;
    for (param, actual) in decl.params.iter().zip(args) {
        let formal = &table.var(*param).declared_type;
        total += distance(table, formal, actual)?;
    }

    Some(total)
}

/// Selects the overload minimizing total parameter distance.
///
/// `position` is the location of the call, carried by either error.
///
/// ## Errors
///
/// Returns [`OverloadError::Ambiguous`] when two candidates tie for the
/// minimum and [`OverloadError::NoMatch`] when no candidate is reachable.
pub fn select(
    table: &DeclTable,
    candidates: &[FunctionId],
    args: &[Type],
    position: Position,
) -> Result<FunctionId, OverloadError> {
    let mut best: Option<(u32, Vec<FunctionId>)> = None;

    for candidate in candidates {
        let Some(total) = candidate_distance(table, *candidate, args) else {
            continue;
        };

        best = match best.take() {
            None => Some((total, vec![*candidate])),
            Some((minimum, _)) if total < minimum => Some((total, vec![*candidate])),
            Some((minimum, mut ties)) => {
                if total == minimum {
                    ties.push(*candidate);
                }
                Some((minimum, ties))
            }
        };
    }

    match best {
        Some((_, ties)) if ties.len() == 1 => Ok(ties[0]),
        Some((_, candidates)) => Err(OverloadError::Ambiguous { candidates, position }),
        None => Err(OverloadError::NoMatch { position }),
    }
}
