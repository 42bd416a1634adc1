use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::game_log::{GameLog, TeamId};
use crate::pipeline::SeasonReport;
use crate::playoff::BidType;

/// Wins over top-25 opponents count as quality; losses to teams ranked
/// outside the top 25 (or unranked) count as bad.
const QUALITY_WIN_CUTOFF: u32 = 25;
const BAD_LOSS_CUTOFF: u32 = 25;

pub struct ExportSummary {
    pub ranking_rows: usize,
    pub championship_rows: usize,
    pub audit_rows: usize,
}

/// Write the full run to a workbook: Rankings, Championships, Bracket, Audit.
pub fn export_report(path: &Path, report: &SeasonReport) -> Result<ExportSummary> {
    let names = report.team_names();
    let rank_of: HashMap<TeamId, u32> = report
        .table
        .iter()
        .map(|r| (r.team_id, r.rank))
        .collect();
    let name = |id: TeamId| names.get(&id).cloned().unwrap_or_else(|| format!("team {id}"));

    let mut ranking_rows = vec![vec![
        "Rank".to_string(),
        "Team".to_string(),
        "Conference".to_string(),
        "W".to_string(),
        "L".to_string(),
        "Composite".to_string(),
        "Resume Rk".to_string(),
        "Predictive Rk".to_string(),
        "SOR Rk".to_string(),
        "SOS Rk".to_string(),
        "Quality Wins".to_string(),
        "Bad Losses".to_string(),
        "Champion".to_string(),
    ]];
    for rec in &report.table {
        ranking_rows.push(vec![
            rec.rank.to_string(),
            name(rec.team_id),
            rec.conference.clone(),
            rec.wins.to_string(),
            rec.losses.to_string(),
            format!("{:.4}", rec.composite_score),
            rec.resume_rank.to_string(),
            rec.predictive_rank.to_string(),
            rec.sor_rank.to_string(),
            rec.sos_rank.to_string(),
            quality_wins(&report.log, rec.team_id, &rank_of).to_string(),
            bad_losses(&report.log, rec.team_id, &rank_of).to_string(),
            yes_no(rec.is_champion),
        ]);
    }

    let mut championship_rows = vec![vec![
        "Conference".to_string(),
        "First".to_string(),
        "Second".to_string(),
        "Winner".to_string(),
        "Decided By".to_string(),
    ]];
    for result in &report.championships {
        championship_rows.push(vec![
            result.conference.clone(),
            name(result.participants.0),
            name(result.participants.1),
            name(result.winner),
            result.decided_by.clone(),
        ]);
    }

    let mut bracket_rows = vec![vec![
        "Seed".to_string(),
        "Team".to_string(),
        "Bid".to_string(),
        "Bye".to_string(),
        "First Round".to_string(),
    ]];
    for slot in &report.field.slots {
        let first_round = report
            .field
            .first_round
            .iter()
            .find(|m| m.host == slot.team_id || m.visitor == slot.team_id)
            .map(|m| {
                if m.host == slot.team_id {
                    format!("hosts ({}) {}", m.low_seed, name(m.visitor))
                } else {
                    format!("at ({}) {}", m.high_seed, name(m.host))
                }
            })
            .unwrap_or_default();
        bracket_rows.push(vec![
            slot.seed.to_string(),
            name(slot.team_id),
            bid_label(slot.bid).to_string(),
            yes_no(slot.bye),
            first_round,
        ]);
    }

    let mut audit_rows = vec![vec![
        "Seed".to_string(),
        "Team".to_string(),
        "Bid".to_string(),
        "Reason".to_string(),
        "Displaced".to_string(),
    ]];
    for entry in &report.audit.entries {
        audit_rows.push(vec![
            entry.seed.to_string(),
            name(entry.team_id),
            bid_label(entry.bid).to_string(),
            entry.reason.clone(),
            entry.displaced.map(name).unwrap_or_default(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rankings")?;
        write_rows(sheet, &ranking_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Championships")?;
        write_rows(sheet, &championship_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bracket")?;
        write_rows(sheet, &bracket_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Audit")?;
        write_rows(sheet, &audit_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportSummary {
        ranking_rows: ranking_rows.len().saturating_sub(1),
        championship_rows: championship_rows.len().saturating_sub(1),
        audit_rows: audit_rows.len().saturating_sub(1),
    })
}

fn quality_wins(log: &GameLog, team: TeamId, rank_of: &HashMap<TeamId, u32>) -> u32 {
    log.games
        .iter()
        .filter(|g| g.winner() == team)
        .filter(|g| {
            rank_of
                .get(&g.loser())
                .is_some_and(|&r| r <= QUALITY_WIN_CUTOFF)
        })
        .count() as u32
}

fn bad_losses(log: &GameLog, team: TeamId, rank_of: &HashMap<TeamId, u32>) -> u32 {
    log.games
        .iter()
        .filter(|g| g.loser() == team)
        .filter(|g| {
            rank_of
                .get(&g.winner())
                .map_or(true, |&r| r > BAD_LOSS_CUTOFF)
        })
        .count() as u32
}

fn bid_label(bid: BidType) -> &'static str {
    match bid {
        BidType::Auto => "automatic",
        BidType::AtLarge => "at-large",
    }
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
