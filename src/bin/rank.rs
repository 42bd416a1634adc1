use std::fs;
use std::path::PathBuf;

use cfp_engine::config::RankingConfig;
use cfp_engine::elo::PriorRatings;
use cfp_engine::export;
use cfp_engine::game_log::{RawGame, Team};
use cfp_engine::pipeline;
use cfp_engine::playoff;

#[derive(Debug, serde::Deserialize)]
struct SeasonFile {
    teams: Vec<Team>,
    games: Vec<RawGame>,
    /// Prior-season closing Elo ratings, keyed by team id.
    #[serde(default)]
    priors: PriorRatings,
    #[serde(default)]
    config: Option<RankingConfig>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let season_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("season.json"));
    let xlsx_path = args.next().map(PathBuf::from);

    let raw = fs::read_to_string(&season_path)?;
    let season: SeasonFile = serde_json::from_str(&raw)?;
    let config = season.config.unwrap_or_default();

    let report = pipeline::run_season(&season.games, &season.teams, &season.priors, &config)?;
    let names = report.team_names();
    let name = |id| {
        names
            .get(&id)
            .map(String::as_str)
            .unwrap_or("(unknown)")
    };

    println!("TOP 25");
    for rec in report.table.iter().take(25) {
        println!(
            "{:>3}. {:<24} {:<14} {:>2}-{:<2}  {:.4}{}",
            rec.rank,
            name(rec.team_id),
            rec.conference,
            rec.wins,
            rec.losses,
            rec.composite_score,
            if rec.is_champion { "  *" } else { "" }
        );
    }
    println!();

    if !report.championships.is_empty() {
        println!("CONFERENCE CHAMPIONSHIPS");
        for result in &report.championships {
            let loser = if result.winner == result.participants.0 {
                result.participants.1
            } else {
                result.participants.0
            };
            println!(
                "  {}: {} over {} ({})",
                result.conference,
                name(result.winner),
                name(loser),
                result.decided_by
            );
        }
        println!();
    }

    println!("{}", playoff::render_bracket(&report.field, &names));

    if let Some(path) = xlsx_path {
        let summary = export::export_report(&path, &report)?;
        println!(
            "wrote {} ranking rows, {} championships, {} audit rows to {}",
            summary.ranking_rows,
            summary.championship_rows,
            summary.audit_rows,
            path.display()
        );
    }

    Ok(())
}
