use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::RankingConfig;
use crate::error::RankingError;
use crate::game_log::{GameLog, TeamId};

/// Raw outputs of the four rater families, keyed by team.
#[derive(Debug, Clone)]
pub struct RaterScores {
    pub colley: HashMap<TeamId, f64>,
    pub massey: HashMap<TeamId, f64>,
    pub elo: HashMap<TeamId, f64>,
    pub win_pct: HashMap<TeamId, f64>,
    pub sor: HashMap<TeamId, f64>,
    pub sos: HashMap<TeamId, f64>,
}

/// One fully ranked team. Immutable once the table is built, except for the
/// champion flag which conference resolution stamps on afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeRecord {
    pub team_id: TeamId,
    pub rank: u32,
    pub composite_score: f64,
    pub resume_rank: u32,
    pub predictive_rank: u32,
    pub sor_rank: u32,
    pub sos_rank: u32,
    pub wins: u32,
    pub losses: u32,
    pub conference: String,
    pub is_champion: bool,
}

/// Min-max normalize to [0, 1]. A degenerate vector (all values equal, or a
/// single team) maps everything to 0.5 instead of dividing by zero.
pub fn min_max_normalize(values: &HashMap<TeamId, f64>) -> HashMap<TeamId, f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.values() {
        min = min.min(v);
        max = max.max(v);
    }
    let span = max - min;
    values
        .iter()
        .map(|(&t, &v)| {
            let norm = if span > 0.0 { (v - min) / span } else { 0.5 };
            (t, norm)
        })
        .collect()
}

/// Provisional 0-1 opponent strength from the resume and predictive families
/// only, used to rate opponents for SOR before SOR itself exists.
pub fn provisional_ratings(
    colley: &HashMap<TeamId, f64>,
    massey: &HashMap<TeamId, f64>,
    elo: &HashMap<TeamId, f64>,
    win_pct: &HashMap<TeamId, f64>,
) -> HashMap<TeamId, f64> {
    let colley_n = min_max_normalize(colley);
    let massey_n = min_max_normalize(massey);
    let elo_n = min_max_normalize(elo);
    let win_n = min_max_normalize(win_pct);

    let provisional: HashMap<TeamId, f64> = colley_n
        .keys()
        .map(|&t| {
            let resume = 0.6 * colley_n[&t] + 0.4 * win_n[&t];
            let predictive = 0.5 * massey_n[&t] + 0.5 * elo_n[&t];
            (t, 0.5 * resume + 0.5 * predictive)
        })
        .collect();
    min_max_normalize(&provisional)
}

/// Fuse rater outputs into the final ranked table.
pub fn fuse(
    log: &GameLog,
    scores: &RaterScores,
    config: &RankingConfig,
) -> Result<Vec<CompositeRecord>, RankingError> {
    let colley_n = min_max_normalize(&scores.colley);
    let massey_n = min_max_normalize(&scores.massey);
    let elo_n = min_max_normalize(&scores.elo);
    let win_n = min_max_normalize(&scores.win_pct);
    let sor_n = min_max_normalize(&scores.sor);
    let sos_n = min_max_normalize(&scores.sos);

    let w = &config.composite_weights;
    let mut resume = HashMap::new();
    let mut predictive = HashMap::new();
    let mut composite = HashMap::new();
    for &t in &log.active_teams {
        let res = 0.6 * colley_n[&t] + 0.4 * win_n[&t];
        let pred = 0.5 * massey_n[&t] + 0.5 * elo_n[&t];
        let comp =
            w.resume * res + w.predictive * pred + w.sor * sor_n[&t] + w.sos * sos_n[&t];
        resume.insert(t, res);
        predictive.insert(t, pred);
        composite.insert(t, comp);
    }

    let resume_rank = rank_descending(&resume);
    let predictive_rank = rank_descending(&predictive);
    let sor_rank = rank_descending(&scores.sor);
    let sos_rank = rank_descending(&scores.sos);

    // First pass: composite descending, team id as a stable key so the order
    // never depends on input row order.
    let mut order: Vec<TeamId> = log.active_teams.clone();
    order.sort_by(|a, b| {
        composite[b]
            .partial_cmp(&composite[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b))
    });

    apply_tiebreak_waterfall(log, &mut order, &composite, &sos_rank, &sor_rank, config)?;

    let mut out = Vec::with_capacity(order.len());
    for (pos, &t) in order.iter().enumerate() {
        let rec = log.record(t);
        let conference = log
            .teams
            .get(&t)
            .map(|team| team.conference.clone())
            .unwrap_or_default();
        out.push(CompositeRecord {
            team_id: t,
            rank: pos as u32 + 1,
            composite_score: composite[&t],
            resume_rank: resume_rank[&t],
            predictive_rank: predictive_rank[&t],
            sor_rank: sor_rank[&t],
            sos_rank: sos_rank[&t],
            wins: rec.wins,
            losses: rec.losses,
            conference,
            is_champion: false,
        });
    }
    Ok(out)
}

fn rank_descending(values: &HashMap<TeamId, f64>) -> HashMap<TeamId, u32> {
    let mut order: Vec<TeamId> = values.keys().copied().collect();
    order.sort_by(|a, b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b))
    });
    order
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t, i as u32 + 1))
        .collect()
}

/// Settle neighborhoods of near-tied teams with the committee waterfall:
/// head-to-head, then common opponents, then SOS rank, then SOR rank, then
/// the raw composite value. Runs as bounded adjacent-swap passes so an
/// inconsistent comparator can never poison a library sort, and so the result
/// is a fixpoint independent of where each team started.
fn apply_tiebreak_waterfall(
    log: &GameLog,
    order: &mut [TeamId],
    composite: &HashMap<TeamId, f64>,
    sos_rank: &HashMap<TeamId, u32>,
    sor_rank: &HashMap<TeamId, u32>,
    config: &RankingConfig,
) -> Result<(), RankingError> {
    for _ in 0..order.len() {
        let mut swapped = false;
        for i in 0..order.len().saturating_sub(1) {
            let (a, b) = (order[i], order[i + 1]);
            if (composite[&a] - composite[&b]).abs() >= config.tie_threshold {
                continue;
            }
            match waterfall(log, a, b, composite, sos_rank, sor_rank)? {
                Ordering::Greater => {
                    order.swap(i, i + 1);
                    swapped = true;
                    debug!(ahead = b, behind = a, "tie-break waterfall reordered pair");
                }
                Ordering::Less | Ordering::Equal => {}
            }
        }
        if !swapped {
            break;
        }
    }
    Ok(())
}

/// Less means `a` ranks ahead of `b`.
fn waterfall(
    log: &GameLog,
    a: TeamId,
    b: TeamId,
    composite: &HashMap<TeamId, f64>,
    sos_rank: &HashMap<TeamId, u32>,
    sor_rank: &HashMap<TeamId, u32>,
) -> Result<Ordering, RankingError> {
    let h2h = log.head_to_head(a, b);
    if h2h != 0 {
        return Ok(if h2h > 0 { Ordering::Less } else { Ordering::Greater });
    }

    let common = log.common_opponent_margin(a, b);
    if common != 0 {
        return Ok(if common > 0 { Ordering::Less } else { Ordering::Greater });
    }

    if sos_rank[&a] != sos_rank[&b] {
        return Ok(sos_rank[&a].cmp(&sos_rank[&b]));
    }
    if sor_rank[&a] != sor_rank[&b] {
        return Ok(sor_rank[&a].cmp(&sor_rank[&b]));
    }

    match composite[&b].partial_cmp(&composite[&a]) {
        Some(Ordering::Less) => Ok(Ordering::Less),
        Some(Ordering::Greater) => Ok(Ordering::Greater),
        _ => Err(RankingError::TieUnresolved(a, b)),
    }
}
