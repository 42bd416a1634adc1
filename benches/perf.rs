use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use cfp_engine::colley::compute_colley;
use cfp_engine::composite::{fuse, provisional_ratings, RaterScores};
use cfp_engine::config::RankingConfig;
use cfp_engine::elo::compute_elo;
use cfp_engine::game_log::{GameLog, RawGame, Team, TeamId};
use cfp_engine::massey::compute_massey;
use cfp_engine::pipeline::run_season;
use cfp_engine::schedule::{compute_sor, compute_sos};

/// An FBS-sized season: 10 conferences of 13 teams, full intra-conference
/// round robin plus three cross-conference games per team.
fn fbs_season() -> (Vec<Team>, Vec<RawGame>) {
    let conferences = 10u32;
    let per_conf = 13u32;

    let mut teams = Vec::new();
    for c in 0..conferences {
        for i in 0..per_conf {
            let id = c * per_conf + i + 1;
            teams.push(Team {
                id,
                school: format!("School {id}"),
                conference: format!("Conference {c}"),
                conference_champion: false,
            });
        }
    }

    let mut games = Vec::new();
    let mut game_id = 0u64;
    let mut push = |games: &mut Vec<RawGame>, home: TeamId, away: TeamId, week: u8, margin: i32| {
        game_id += 1;
        games.push(RawGame {
            id: game_id,
            season: 2025,
            week,
            home_team: home,
            away_team: away,
            home_points: Some(21 + margin.max(1)),
            away_points: Some(21),
            neutral_site: false,
            completed: true,
            start_date: None,
        });
    };

    for c in 0..conferences {
        let base = c * per_conf + 1;
        for a in 0..per_conf {
            for b in (a + 1)..per_conf {
                let week = (5 + (a + b) % 10) as u8;
                push(&mut games, base + a, base + b, week, (b - a) as i32 * 3);
            }
        }
    }
    for c in 0..conferences {
        for i in 0..per_conf {
            for k in 1..=3u32 {
                let home = c * per_conf + i + 1;
                let away = ((c + k) % conferences) * per_conf + ((i + k) % per_conf) + 1;
                push(&mut games, home, away, (6 + (i + k) % 9) as u8, 7);
            }
        }
    }
    (teams, games)
}

fn bench_log_build(c: &mut Criterion) {
    let (teams, games) = fbs_season();
    let config = RankingConfig::default();
    c.bench_function("log_build", |b| {
        b.iter(|| {
            let log = GameLog::build(black_box(&games), black_box(&teams), &config);
            black_box(log.games.len());
        })
    });
}

fn bench_linear_raters(c: &mut Criterion) {
    let (teams, games) = fbs_season();
    let config = RankingConfig::default();
    let log = GameLog::build(&games, &teams, &config);

    c.bench_function("colley_solve", |b| {
        b.iter(|| {
            let ratings = compute_colley(black_box(&log)).unwrap();
            black_box(ratings.len());
        })
    });
    c.bench_function("massey_solve", |b| {
        b.iter(|| {
            let ratings = compute_massey(black_box(&log)).unwrap();
            black_box(ratings.len());
        })
    });
}

fn bench_elo_pass(c: &mut Criterion) {
    let (teams, games) = fbs_season();
    let config = RankingConfig::default();
    let log = GameLog::build(&games, &teams, &config);
    let priors = HashMap::new();

    c.bench_function("elo_pass", |b| {
        b.iter(|| {
            let ratings = compute_elo(black_box(&log), &config, &priors);
            black_box(ratings.len());
        })
    });
}

fn bench_fuse(c: &mut Criterion) {
    let (teams, games) = fbs_season();
    let config = RankingConfig::default();
    let log = GameLog::build(&games, &teams, &config);

    let colley = compute_colley(&log).unwrap();
    let massey = compute_massey(&log).unwrap();
    let elo = compute_elo(&log, &config, &HashMap::new());
    let win_pct: HashMap<TeamId, f64> = log
        .active_teams
        .iter()
        .map(|&t| (t, log.record(t).win_pct()))
        .collect();
    let sos = compute_sos(&log);
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

    c.bench_function("fuse", |b| {
        b.iter(|| {
            let table = fuse(black_box(&log), black_box(&scores), &config).unwrap();
            black_box(table.len());
        })
    });
}

fn bench_full_season(c: &mut Criterion) {
    let (teams, games) = fbs_season();
    let config = RankingConfig::default();
    let priors = HashMap::new();

    c.bench_function("full_season", |b| {
        b.iter(|| {
            let report = run_season(black_box(&games), &teams, &priors, &config).unwrap();
            black_box(report.field.slots.len());
        })
    });
}

criterion_group!(
    perf,
    bench_log_build,
    bench_linear_raters,
    bench_elo_pass,
    bench_fuse,
    bench_full_season
);
criterion_main!(perf);
