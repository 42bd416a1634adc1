use std::collections::HashMap;

use crate::config::RankingConfig;
use crate::game_log::{GameLog, TeamId};

const BASE_RATING: f64 = 1505.0;
/// 55 Elo points per 3.75 points of home field, the conventional conversion.
const ELO_PER_POINT: f64 = 55.0 / 3.75;

/// Prior-season closing ratings, used to seed the new season.
pub type PriorRatings = HashMap<TeamId, f64>;

/// Sequential Elo over the normalized log.
///
/// Games are processed in `(week, start_date, id)` order, which the log
/// already guarantees. Same-week games with disjoint team sets commute, so
/// the final ratings do not depend on provider row order.
///
/// The margin-of-victory multiplier replaces the binary win/loss outcome with
/// a logistic of the HFA-adjusted capped margin:
///
///   actual_home = 1 / (1 + 10^(-adjusted_margin / mov_scale))
///
/// with mov_scale = 17 by default. A one-score home win lands near 0.5 rather
/// than 1.0, a four-touchdown road win saturates toward 1.0, and the update
/// stays continuous through margin zero.
pub fn compute_elo(
    log: &GameLog,
    config: &RankingConfig,
    priors: &PriorRatings,
) -> HashMap<TeamId, f64> {
    let mut ratings: HashMap<TeamId, f64> = log
        .active_teams
        .iter()
        .map(|&t| (t, season_start_rating(priors.get(&t).copied(), config)))
        .collect();

    for g in &log.games {
        let rh = ratings[&g.home];
        let ra = ratings[&g.away];

        let hfa_elo = if g.neutral_site {
            0.0
        } else {
            config.hfa_points * ELO_PER_POINT
        };
        let expected_home = expected_score(rh + hfa_elo, ra);
        let actual_home = 1.0 / (1.0 + 10.0_f64.powf(-g.adjusted_margin / config.elo_mov_scale));

        let delta = config.elo_k_factor * (actual_home - expected_home);
        ratings.insert(g.home, rh + delta);
        ratings.insert(g.away, ra - delta);
    }

    ratings
}

/// Regress a prior closing rating toward the mean; new programs start flat.
fn season_start_rating(prior: Option<f64>, config: &RankingConfig) -> f64 {
    match prior {
        Some(p) => BASE_RATING + config.elo_mean_regression * (p - BASE_RATING),
        None => BASE_RATING,
    }
}

fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}
