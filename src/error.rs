use thiserror::Error;

/// Engine error taxonomy.
///
/// `Validation` covers individual bad rows and is normally recovered by
/// dropping the row; the other variants indicate a broken invariant and
/// abort the run. There is no partial ranking output.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("invalid game data: {0}")]
    Validation(String),

    /// A rating solve failed numerically. The Colley and Massey systems are
    /// solvable for any valid game graph, so this points at corrupted input
    /// (duplicate or malformed games) rather than a numeric edge case.
    #[error("rating computation failed: {0}")]
    Computation(String),

    #[error("playoff selection impossible: {0}")]
    Selection(String),

    /// The tie-break waterfall failed to produce a strict order. Should never
    /// happen; detected rather than silently emitting tied ranks.
    #[error("unresolved tie between teams {0} and {1}")]
    TieUnresolved(u32, u32),
}
