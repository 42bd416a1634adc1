use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::error::RankingError;
use crate::game_log::{GameLog, TeamId};

/// Colley Matrix ratings. Pure win/loss resume metric: margins never enter.
///
/// C[i][i] = 2 + games_i, C[i][j] = -(games between i and j),
/// b[i] = 1 + (wins_i - losses_i) / 2, solved as Cr = b.
/// The system is diagonally dominant for any valid game graph, so a solver
/// failure means the log itself is corrupt.
pub fn compute_colley(log: &GameLog) -> Result<HashMap<TeamId, f64>, RankingError> {
    let teams = &log.active_teams;
    let n = teams.len();
    if n == 0 {
        return Ok(HashMap::new());
    }

    let idx: HashMap<TeamId, usize> = teams.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    let mut c = DMatrix::<f64>::zeros(n, n);
    let mut b = DVector::<f64>::zeros(n);

    for g in &log.games {
        let h = idx[&g.home];
        let a = idx[&g.away];
        c[(h, h)] += 1.0;
        c[(a, a)] += 1.0;
        c[(h, a)] -= 1.0;
        c[(a, h)] -= 1.0;
    }
    for (i, team) in teams.iter().enumerate() {
        c[(i, i)] += 2.0;
        let rec = log.record(*team);
        b[i] = 1.0 + 0.5 * (rec.wins as f64 - rec.losses as f64);
    }

    let solved = c.lu().solve(&b).ok_or_else(|| {
        RankingError::Computation(format!("Colley system singular across {n} teams"))
    })?;

    Ok(teams
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, solved[i]))
        .collect())
}
