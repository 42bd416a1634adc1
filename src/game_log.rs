use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RankingConfig;

pub type TeamId = u32;

/// A game row as delivered by the external data fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGame {
    pub id: u64,
    pub season: u16,
    pub week: u8,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_points: Option<i32>,
    pub away_points: Option<i32>,
    #[serde(default)]
    pub neutral_site: bool,
    #[serde(default = "default_true")]
    pub completed: bool,
    /// ISO-ish timestamp from the provider; only used for intra-week ordering.
    #[serde(default)]
    pub start_date: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub school: String,
    pub conference: String,
    /// Pre-flagged champion status, used when conference resolution is skipped.
    #[serde(default)]
    pub conference_champion: bool,
}

/// A validated, margin-adjusted game. Immutable once built.
#[derive(Debug, Clone)]
pub struct NormalizedGame {
    pub id: u64,
    pub week: u8,
    pub home: TeamId,
    pub away: TeamId,
    pub home_points: i32,
    pub away_points: i32,
    pub neutral_site: bool,
    /// home - away, clamped to ±mov_cap.
    pub capped_margin: f64,
    /// capped margin with home field advantage removed.
    pub adjusted_margin: f64,
    pub start_date: Option<String>,
}

impl NormalizedGame {
    pub fn winner(&self) -> TeamId {
        if self.home_points > self.away_points {
            self.home
        } else {
            self.away
        }
    }

    pub fn loser(&self) -> TeamId {
        if self.home_points > self.away_points {
            self.away
        } else {
            self.home
        }
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home == team || self.away == team
    }

    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if self.home == team {
            Some(self.away)
        } else if self.away == team {
            Some(self.home)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
}

impl TeamRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    /// 0.5 for teams with no games, so schedule math never divides by zero.
    pub fn win_pct(&self) -> f64 {
        if self.games() == 0 {
            0.5
        } else {
            self.wins as f64 / self.games() as f64
        }
    }
}

/// The normalized season log every rater consumes. Built once per run.
#[derive(Debug, Clone)]
pub struct GameLog {
    pub games: Vec<NormalizedGame>,
    pub teams: HashMap<TeamId, Team>,
    /// Teams appearing in at least one retained game, sorted by id so every
    /// consumer iterates in the same order regardless of input row order.
    pub active_teams: Vec<TeamId>,
    records: HashMap<TeamId, TeamRecord>,
    opponents: HashMap<TeamId, Vec<TeamId>>,
}

impl GameLog {
    /// Validate and normalize raw rows. Bad rows (unknown team, missing or
    /// negative score) are dropped with a warning; they never abort the run.
    pub fn build(raw: &[RawGame], roster: &[Team], config: &RankingConfig) -> Self {
        let teams: HashMap<TeamId, Team> = roster.iter().map(|t| (t.id, t.clone())).collect();

        let mut games = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();
        for row in raw {
            if !seen.insert(row.id) {
                warn!(game_id = row.id, "duplicate game id, dropping row");
                continue;
            }
            match normalize_row(row, &teams, config) {
                Ok(Some(game)) => games.push(game),
                Ok(None) => {}
                Err(reason) => {
                    warn!(game_id = row.id, %reason, "dropping malformed game row");
                }
            }
        }

        // Chronological order; provider timestamps are ISO-ish so string
        // ordering is acceptable, with the game id as a stable final key.
        games.sort_by(|a, b| {
            a.week
                .cmp(&b.week)
                .then_with(|| a.start_date.cmp(&b.start_date))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut records: HashMap<TeamId, TeamRecord> = HashMap::new();
        let mut opponents: HashMap<TeamId, Vec<TeamId>> = HashMap::new();
        for g in &games {
            records.entry(g.winner()).or_default().wins += 1;
            records.entry(g.loser()).or_default().losses += 1;
            opponents.entry(g.home).or_default().push(g.away);
            opponents.entry(g.away).or_default().push(g.home);
        }

        let mut active_teams: Vec<TeamId> = records.keys().copied().collect();
        active_teams.sort_unstable();

        Self {
            games,
            teams,
            active_teams,
            records,
            opponents,
        }
    }

    pub fn record(&self, team: TeamId) -> TeamRecord {
        self.records.get(&team).copied().unwrap_or_default()
    }

    /// One entry per game played, duplicates included for rematches.
    pub fn opponents(&self, team: TeamId) -> &[TeamId] {
        self.opponents.get(&team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Net head-to-head wins for `a` over `b` across all meetings.
    pub fn head_to_head(&self, a: TeamId, b: TeamId) -> i32 {
        let mut net = 0;
        for g in &self.games {
            if g.involves(a) && g.involves(b) {
                if g.winner() == a {
                    net += 1;
                } else {
                    net -= 1;
                }
            }
        }
        net
    }

    /// Win-loss differential against opponents both teams played.
    pub fn common_opponent_margin(&self, a: TeamId, b: TeamId) -> i32 {
        let opp_a: HashSet<TeamId> = self.opponents(a).iter().copied().collect();
        let opp_b: HashSet<TeamId> = self.opponents(b).iter().copied().collect();
        let common: HashSet<TeamId> = opp_a.intersection(&opp_b).copied().collect();
        if common.is_empty() {
            return 0;
        }

        let net_vs_common = |team: TeamId| -> i32 {
            let mut net = 0;
            for g in &self.games {
                let Some(opp) = g.opponent_of(team) else { continue };
                if !common.contains(&opp) {
                    continue;
                }
                if g.winner() == team {
                    net += 1;
                } else {
                    net -= 1;
                }
            }
            net
        };

        net_vs_common(a) - net_vs_common(b)
    }

    /// Record of `team` with all meetings against `exclude` removed. The SOS
    /// convention: an opponent's record should not be inflated or deflated by
    /// the game against the team being evaluated.
    pub fn record_excluding(&self, team: TeamId, exclude: TeamId) -> TeamRecord {
        let mut rec = TeamRecord::default();
        for g in &self.games {
            if !g.involves(team) || g.opponent_of(team) == Some(exclude) {
                continue;
            }
            if g.winner() == team {
                rec.wins += 1;
            } else {
                rec.losses += 1;
            }
        }
        rec
    }
}

fn normalize_row(
    row: &RawGame,
    teams: &HashMap<TeamId, Team>,
    config: &RankingConfig,
) -> Result<Option<NormalizedGame>, String> {
    if !teams.contains_key(&row.home_team) {
        return Err(format!("unknown home team {}", row.home_team));
    }
    if !teams.contains_key(&row.away_team) {
        return Err(format!("unknown away team {}", row.away_team));
    }
    if row.home_team == row.away_team {
        return Err(format!("team {} plays itself", row.home_team));
    }

    // Poll-week and completion filters are policy, not data errors.
    if !row.completed || row.week < config.start_week {
        return Ok(None);
    }

    let (Some(home_points), Some(away_points)) = (row.home_points, row.away_points) else {
        return Err("missing score".to_string());
    };
    if home_points < 0 || away_points < 0 {
        return Err(format!("negative score {home_points}-{away_points}"));
    }
    if home_points == away_points {
        // FBS overtime rules mean ties cannot happen in real data.
        return Err(format!("tied score {home_points}-{away_points}"));
    }

    let raw_margin = (home_points - away_points) as f64;
    let capped_margin = raw_margin.clamp(-config.mov_cap, config.mov_cap);
    let hfa = if row.neutral_site { 0.0 } else { config.hfa_points };
    let adjusted_margin = capped_margin - hfa;

    Ok(Some(NormalizedGame {
        id: row.id,
        week: row.week,
        home: row.home_team,
        away: row.away_team,
        home_points,
        away_points,
        neutral_site: row.neutral_site,
        capped_margin,
        adjusted_margin,
        start_date: row.start_date.clone(),
    }))
}
