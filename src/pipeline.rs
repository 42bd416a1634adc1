use std::collections::HashMap;

use rayon::join;
use serde::Serialize;
use tracing::info;

use crate::colley::compute_colley;
use crate::composite::{fuse, provisional_ratings, CompositeRecord, RaterScores};
use crate::conference::{resolve_conferences, ChampionshipResult, ConferenceStanding};
use crate::config::RankingConfig;
use crate::elo::{compute_elo, PriorRatings};
use crate::error::RankingError;
use crate::game_log::{GameLog, RawGame, Team, TeamId};
use crate::massey::compute_massey;
use crate::playoff::{select_field, PlayoffField, SelectionAudit};
use crate::schedule::{compute_sor, compute_sos};

/// Everything one end-to-end run produces.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    pub table: Vec<CompositeRecord>,
    pub standings: Vec<ConferenceStanding>,
    pub championships: Vec<ChampionshipResult>,
    pub field: PlayoffField,
    pub audit: SelectionAudit,
    /// The normalized log the run was computed from, kept for exporters.
    #[serde(skip)]
    pub log: GameLog,
}

impl SeasonReport {
    pub fn team_names(&self) -> HashMap<TeamId, String> {
        self.log
            .teams
            .values()
            .map(|t| (t.id, t.school.clone()))
            .collect()
    }
}

/// Run the whole season: normalize, rate, fuse, crown champions, select the
/// field. Fatal errors (singular systems, too few champions) abort the run;
/// malformed game rows were already dropped during normalization.
pub fn run_season(
    games: &[RawGame],
    roster: &[Team],
    priors: &PriorRatings,
    config: &RankingConfig,
) -> Result<SeasonReport, RankingError> {
    config.validate()?;

    let log = GameLog::build(games, roster, config);
    info!(
        games = log.games.len(),
        teams = log.active_teams.len(),
        "normalized season log"
    );

    let win_pct: HashMap<TeamId, f64> = log
        .active_teams
        .iter()
        .map(|&t| (t, log.record(t).win_pct()))
        .collect();

    // The linear-system raters are independent of the sequential ones.
    let ((colley, massey), (elo, sos)) = join(
        || join(|| compute_colley(&log), || compute_massey(&log)),
        || join(|| compute_elo(&log, config, priors), || compute_sos(&log)),
    );
    let colley = colley?;
    let massey = massey?;

    // SOR needs opponent strengths, so it runs after a provisional fusion of
    // the other four raters.
    let provisional = provisional_ratings(&colley, &massey, &elo, &win_pct);
    let sor = compute_sor(&log, &provisional);

    let scores = RaterScores {
        colley,
        massey,
        elo,
        win_pct,
        sor,
        sos,
    };
    let mut table = fuse(&log, &scores, config)?;

    // Champions either arrive pre-flagged on the roster (the games are done)
    // or get projected from standings and the championship-winner policy.
    let (standings, championships);
    let preset: Vec<TeamId> = roster
        .iter()
        .filter(|t| t.conference_champion)
        .map(|t| t.id)
        .collect();
    if preset.is_empty() {
        let (s, c) = resolve_conferences(&log, &table, config);
        let winners: Vec<TeamId> = c.iter().map(|r| r.winner).collect();
        stamp_champions(&mut table, &winners);
        standings = s;
        championships = c;
    } else {
        stamp_champions(&mut table, &preset);
        standings = Vec::new();
        championships = Vec::new();
    }

    let (field, audit) = select_field(&table)?;
    info!(champions = table.iter().filter(|r| r.is_champion).count(), "field selected");

    Ok(SeasonReport {
        table,
        standings,
        championships,
        field,
        audit,
        log,
    })
}

fn stamp_champions(table: &mut [CompositeRecord], champions: &[TeamId]) {
    for rec in table.iter_mut() {
        rec.is_champion = champions.contains(&rec.team_id);
    }
}
