use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::error::RankingError;
use crate::game_log::{GameLog, TeamId};

/// Massey least-squares ratings over HFA-adjusted, capped margins.
///
/// One incidence row per game (+1 home, -1 away) against the adjusted margin,
/// solved through the normal equations MᵀM r = Mᵀd. That system has a
/// one-dimensional null space (any constant shift of all ratings fits the
/// margins equally well), so the last row is replaced by a ratings-sum-to-zero
/// constraint to pin a unique solution centered at zero.
pub fn compute_massey(log: &GameLog) -> Result<HashMap<TeamId, f64>, RankingError> {
    let teams = &log.active_teams;
    let n = teams.len();
    if n == 0 {
        return Ok(HashMap::new());
    }
    if n == 1 {
        return Ok(HashMap::from([(teams[0], 0.0)]));
    }

    let idx: HashMap<TeamId, usize> = teams.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    // Build MᵀM and Mᵀd directly; the incidence matrix itself never needs to
    // be materialized for a few hundred games.
    let mut mtm = DMatrix::<f64>::zeros(n, n);
    let mut mtd = DVector::<f64>::zeros(n);
    for g in &log.games {
        let h = idx[&g.home];
        let a = idx[&g.away];
        mtm[(h, h)] += 1.0;
        mtm[(a, a)] += 1.0;
        mtm[(h, a)] -= 1.0;
        mtm[(a, h)] -= 1.0;
        mtd[h] += g.adjusted_margin;
        mtd[a] -= g.adjusted_margin;
    }

    for j in 0..n {
        mtm[(n - 1, j)] = 1.0;
    }
    mtd[n - 1] = 0.0;

    let solved = mtm.lu().solve(&mtd).ok_or_else(|| {
        RankingError::Computation(format!(
            "Massey system singular across {n} teams; game graph may be disconnected or corrupt"
        ))
    })?;

    Ok(teams
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, solved[i]))
        .collect())
}
