//! Target filter evaluation
//!
//! `TargetFilter` is declared in delve-types as pure config data; this module
//! evaluates filters against host-provided actor snapshots and picks concrete
//! targets for scripted casts.

use delve_types::{Position, TargetFilter};

use crate::host::{ActorKind, ActorSnapshot};

/// Check whether one candidate satisfies `filter`, with ranges measured from
/// `origin` (normally the boss position).
pub fn matches(filter: &TargetFilter, candidate: &ActorSnapshot, origin: &Position) -> bool {
    match filter {
        TargetFilter::Any => true,
        TargetFilter::Players => candidate.kind == ActorKind::Player,
        TargetFilter::Helpers => candidate.kind == ActorKind::Helper,
        TargetFilter::Alive => candidate.alive,
        TargetFilter::WithinRange { range } => candidate.position.distance_to(origin) <= *range,
        TargetFilter::Not { filter } => !matches(filter, candidate, origin),
        TargetFilter::AllOf { filters } => filters.iter().all(|f| matches(f, candidate, origin)),
    }
}

/// All candidates satisfying `filter`, in the order the host returned them.
pub fn select_all<'a>(
    candidates: &'a [ActorSnapshot],
    filter: &TargetFilter,
    origin: &Position,
) -> Vec<&'a ActorSnapshot> {
    candidates
        .iter()
        .filter(|c| matches(filter, c, origin))
        .collect()
}

/// The matching candidate closest to `origin`, or None when nothing matches.
pub fn select_nearest<'a>(
    candidates: &'a [ActorSnapshot],
    filter: &TargetFilter,
    origin: &Position,
) -> Option<&'a ActorSnapshot> {
    candidates
        .iter()
        .filter(|c| matches(filter, c, origin))
        .min_by(|a, b| {
            a.position
                .distance_to(origin)
                .total_cmp(&b.position.distance_to(origin))
        })
}
