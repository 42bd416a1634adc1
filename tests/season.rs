use std::collections::{HashMap, HashSet};

use cfp_engine::config::RankingConfig;
use cfp_engine::game_log::{RawGame, Team, TeamId};
use cfp_engine::pipeline::run_season;
use cfp_engine::playoff::BidType;

fn team(id: TeamId, conference: &str) -> Team {
    Team {
        id,
        school: format!("School {id}"),
        conference: conference.to_string(),
        conference_champion: false,
    }
}

fn game(id: u64, week: u8, home: TeamId, away: TeamId, hs: i32, as_: i32) -> RawGame {
    RawGame {
        id,
        season: 2025,
        week,
        home_team: home,
        away_team: away,
        home_points: Some(hs),
        away_points: Some(as_),
        neutral_site: false,
        completed: true,
        start_date: None,
    }
}

/// Six conferences of eight, full intra-conference round robin plus two
/// cross-conference games per team. Lower ids win by larger margins, so the
/// expected ordering is roughly by id.
fn season() -> (Vec<Team>, Vec<RawGame>) {
    let conferences = 6u32;
    let per_conf = 8u32;
    let mut teams = Vec::new();
    for c in 0..conferences {
        for i in 0..per_conf {
            teams.push(team(c * per_conf + i + 1, &format!("Conference {c}")));
        }
    }

    let mut games = Vec::new();
    let mut id = 0u64;
    for c in 0..conferences {
        let base = c * per_conf + 1;
        for a in 0..per_conf {
            for b in (a + 1)..per_conf {
                id += 1;
                let margin = 3 + (b - a) as i32 * 4;
                games.push(game(
                    id,
                    (5 + (a + b) % 9) as u8,
                    base + a,
                    base + b,
                    17 + margin,
                    17,
                ));
            }
        }
    }
    for c in 0..conferences {
        for i in 0..per_conf {
            for k in 1..=2u32 {
                id += 1;
                let home = c * per_conf + i + 1;
                let away = ((c + k) % conferences) * per_conf + ((i + k) % per_conf) + 1;
                games.push(game(id, (6 + (i + k) % 8) as u8, home, away, 27, 20));
            }
        }
    }
    (teams, games)
}

#[test]
fn field_invariants_hold() {
    let (teams, games) = season();
    let report = run_season(&games, &teams, &HashMap::new(), &RankingConfig::default()).unwrap();

    assert_eq!(report.field.slots.len(), 12);
    let ids: HashSet<TeamId> = report.field.slots.iter().map(|s| s.team_id).collect();
    assert_eq!(ids.len(), 12, "field must not repeat a team");

    let autos = report
        .field
        .slots
        .iter()
        .filter(|s| s.bid == BidType::Auto)
        .count();
    assert_eq!(autos, 5);
    let byes: Vec<u8> = report
        .field
        .slots
        .iter()
        .filter(|s| s.bye)
        .map(|s| s.seed)
        .collect();
    assert_eq!(byes, vec![1, 2, 3, 4]);

    // Every bye and every seed-12 holder is a champion.
    let champs: HashSet<TeamId> = report
        .table
        .iter()
        .filter(|r| r.is_champion)
        .map(|r| r.team_id)
        .collect();
    for slot in &report.field.slots {
        if slot.bid == BidType::Auto {
            assert!(champs.contains(&slot.team_id));
        }
    }

    let pairs: Vec<(u8, u8)> = report
        .field
        .first_round
        .iter()
        .map(|m| (m.high_seed, m.low_seed))
        .collect();
    assert_eq!(pairs, vec![(5, 12), (6, 11), (7, 10), (8, 9)]);
}

#[test]
fn input_row_order_does_not_change_the_table() {
    let (teams, games) = season();
    let config = RankingConfig::default();
    let baseline = run_season(&games, &teams, &HashMap::new(), &config).unwrap();

    let mut reversed = games.clone();
    reversed.reverse();
    let mut interleaved: Vec<RawGame> = Vec::with_capacity(games.len());
    let half = games.len() / 2;
    for i in 0..half {
        interleaved.push(games[half + i].clone());
        interleaved.push(games[i].clone());
    }
    interleaved.extend(games[2 * half..].iter().cloned());

    for variant in [reversed, interleaved] {
        let report = run_season(&variant, &teams, &HashMap::new(), &config).unwrap();
        let a: Vec<(TeamId, u32)> = baseline.table.iter().map(|r| (r.team_id, r.rank)).collect();
        let b: Vec<(TeamId, u32)> = report.table.iter().map(|r| (r.team_id, r.rank)).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn roster_teams_without_games_are_excluded() {
    let (mut teams, games) = season();
    teams.push(team(999, "Conference 0"));
    let report = run_season(&games, &teams, &HashMap::new(), &RankingConfig::default()).unwrap();
    assert!(report.table.iter().all(|r| r.team_id != 999));
}

#[test]
fn malformed_rows_are_dropped_without_aborting() {
    let (teams, games) = season();
    let config = RankingConfig::default();
    let baseline = run_season(&games, &teams, &HashMap::new(), &config).unwrap();

    let mut dirty = games.clone();
    let next = dirty.len() as u64 + 1;
    // Unknown team, missing score, tie, self-play, pre-cutoff week.
    dirty.push(game(next, 8, 5000, 1, 30, 10));
    dirty.push(RawGame {
        home_points: None,
        ..game(next + 1, 8, 1, 2, 0, 0)
    });
    dirty.push(game(next + 2, 8, 3, 4, 21, 21));
    dirty.push(game(next + 3, 8, 5, 5, 28, 10));
    dirty.push(game(next + 4, 2, 1, 48, 70, 0));

    let report = run_season(&dirty, &teams, &HashMap::new(), &config).unwrap();
    let a: Vec<(TeamId, u32)> = baseline.table.iter().map(|r| (r.team_id, r.rank)).collect();
    let b: Vec<(TeamId, u32)> = report.table.iter().map(|r| (r.team_id, r.rank)).collect();
    assert_eq!(a, b);
}

#[test]
fn composite_ranks_are_dense_and_unique() {
    let (teams, games) = season();
    let report = run_season(&games, &teams, &HashMap::new(), &RankingConfig::default()).unwrap();

    let n = report.table.len() as u32;
    let ranks: HashSet<u32> = report.table.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=n).collect());
    for rec in &report.table {
        assert!(rec.composite_score.is_finite());
        assert!((1..=n).contains(&rec.resume_rank));
        assert!((1..=n).contains(&rec.predictive_rank));
        assert!((1..=n).contains(&rec.sor_rank));
        assert!((1..=n).contains(&rec.sos_rank));
    }
}

#[test]
fn every_conference_crowns_one_champion() {
    let (teams, games) = season();
    let report = run_season(&games, &teams, &HashMap::new(), &RankingConfig::default()).unwrap();

    assert_eq!(report.championships.len(), 6);
    let mut seen = HashSet::new();
    for result in &report.championships {
        assert!(seen.insert(result.conference.clone()));
        assert!(
            result.winner == result.participants.0 || result.winner == result.participants.1
        );
    }
    assert_eq!(report.table.iter().filter(|r| r.is_champion).count(), 6);
}
