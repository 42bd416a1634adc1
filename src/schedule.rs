use std::collections::HashMap;

use crate::game_log::{GameLog, TeamId};

/// Rating of an average Top-25 team on the 0-1 composite scale.
const SOR_BASELINE: f64 = 0.75;
const SOR_SCALE: f64 = 0.25;
const MIN_PROB: f64 = 1e-12;

/// Strength of Schedule: (2·OR + OOR) / 3.
///
/// OR is the mean win% of a team's opponents, OOR the mean win% of the
/// opponents' own opponents. Both exclude games against the team being
/// evaluated so its own results can't inflate its schedule. The recursion is
/// exactly one hop; cycles in the opponent graph are irrelevant because no
/// deeper traversal ever happens.
pub fn compute_sos(log: &GameLog) -> HashMap<TeamId, f64> {
    log.active_teams
        .iter()
        .map(|&team| (team, sos_for_team(log, team)))
        .collect()
}

fn sos_for_team(log: &GameLog, team: TeamId) -> f64 {
    let opponents = log.opponents(team);
    if opponents.is_empty() {
        return 0.5;
    }

    let or: f64 = opponents
        .iter()
        .map(|&opp| log.record_excluding(opp, team).win_pct())
        .sum::<f64>()
        / opponents.len() as f64;

    let mut oor_sum = 0.0;
    let mut oor_n = 0usize;
    for &opp in opponents {
        let second_hop = log.opponents(opp);
        let mut pcts = Vec::with_capacity(second_hop.len());
        for &opp_opp in second_hop {
            if opp_opp == team {
                continue;
            }
            pcts.push(log.record(opp_opp).win_pct());
        }
        if !pcts.is_empty() {
            oor_sum += pcts.iter().sum::<f64>() / pcts.len() as f64;
            oor_n += 1;
        }
    }
    let oor = if oor_n > 0 { oor_sum / oor_n as f64 } else { 0.5 };

    (2.0 * or + oor) / 3.0
}

/// Strength of Record: how hard this exact record was to achieve.
///
/// For every game, take the probability an average Top-25 team would have won
/// against that opponent (logistic in opponent strength). The joint
/// likelihood multiplies win probabilities over wins and loss probabilities
/// over losses; a less likely record is a more impressive one. The score is
/// the negative log10 of the likelihood, accumulated in log space so a long
/// season can never underflow. A winless team is scored purely from its loss
/// probabilities.
pub fn compute_sor(
    log: &GameLog,
    opponent_ratings: &HashMap<TeamId, f64>,
) -> HashMap<TeamId, f64> {
    log.active_teams
        .iter()
        .map(|&team| (team, sor_for_team(log, team, opponent_ratings)))
        .collect()
}

fn sor_for_team(log: &GameLog, team: TeamId, opponent_ratings: &HashMap<TeamId, f64>) -> f64 {
    let mut neg_log10 = 0.0;
    for g in &log.games {
        let Some(opp) = g.opponent_of(team) else { continue };
        let opp_rating = opponent_ratings.get(&opp).copied().unwrap_or(0.5);
        let p_win = baseline_win_prob(opp_rating);
        let p = if g.winner() == team { p_win } else { 1.0 - p_win };
        neg_log10 -= p.max(MIN_PROB).log10();
    }
    neg_log10
}

fn baseline_win_prob(opponent_rating: f64) -> f64 {
    let diff = SOR_BASELINE - opponent_rating;
    1.0 / (1.0 + 10.0_f64.powf(-diff / SOR_SCALE))
}
