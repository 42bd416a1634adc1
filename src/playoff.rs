use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::composite::CompositeRecord;
use crate::error::RankingError;
use crate::game_log::TeamId;

pub const FIELD_SIZE: usize = 12;
pub const AUTO_BIDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BidType {
    Auto,
    AtLarge,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayoffSlot {
    pub team_id: TeamId,
    pub seed: u8,
    pub bid: BidType,
    pub bye: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Matchup {
    pub high_seed: u8,
    pub low_seed: u8,
    /// First-round games are on campus; the higher seed hosts.
    pub host: TeamId,
    pub visitor: TeamId,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayoffField {
    pub slots: Vec<PlayoffSlot>,
    pub first_round: Vec<Matchup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub seed: u8,
    pub team_id: TeamId,
    pub bid: BidType,
    pub reason: String,
    /// Set when an auto bid outside the top 12 pushed this team's slot down
    /// the at-large board; names the team that lost out.
    pub displaced: Option<TeamId>,
}

/// One entry per slot filled, enough for an external renderer to reconstruct
/// every selection decision.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionAudit {
    pub entries: Vec<AuditEntry>,
}

/// 5+7 selection over a ranked table whose champion flags are already set.
///
/// The five highest-composite conference champions receive automatic bids:
/// the best four take seeds 1-4 with byes, the fifth takes seed 12. The seven
/// highest-ranked remaining teams fill seeds 5-11. Fewer than five champions
/// or fewer than twelve eligible teams is a configuration failure the
/// selector refuses to paper over.
pub fn select_field(table: &[CompositeRecord]) -> Result<(PlayoffField, SelectionAudit), RankingError> {
    if table.len() < FIELD_SIZE {
        return Err(RankingError::Selection(format!(
            "need {FIELD_SIZE} eligible teams, have {}",
            table.len()
        )));
    }

    // Table rows arrive rank-ordered; champions inherit that order.
    let champions: Vec<&CompositeRecord> = table.iter().filter(|r| r.is_champion).collect();
    if champions.len() < AUTO_BIDS {
        return Err(RankingError::Selection(format!(
            "need {AUTO_BIDS} conference champions for automatic bids, found {}",
            champions.len()
        )));
    }
    let auto: Vec<&CompositeRecord> = champions.into_iter().take(AUTO_BIDS).collect();
    let auto_ids: Vec<TeamId> = auto.iter().map(|r| r.team_id).collect();

    let at_large: Vec<&CompositeRecord> = table
        .iter()
        .filter(|r| !auto_ids.contains(&r.team_id))
        .take(FIELD_SIZE - AUTO_BIDS)
        .collect();

    // If the fifth auto bid sits outside the overall top 12, it displaced the
    // team that would otherwise have claimed the last at-large slot.
    let fifth = auto[AUTO_BIDS - 1];
    let displaced = if fifth.rank as usize > FIELD_SIZE {
        table
            .iter()
            .filter(|r| !auto_ids.contains(&r.team_id))
            .nth(FIELD_SIZE - AUTO_BIDS)
            .map(|r| r.team_id)
    } else {
        None
    };

    let mut slots = Vec::with_capacity(FIELD_SIZE);
    let mut entries = Vec::with_capacity(FIELD_SIZE);

    for (i, rec) in auto.iter().take(4).enumerate() {
        let seed = i as u8 + 1;
        slots.push(PlayoffSlot {
            team_id: rec.team_id,
            seed,
            bid: BidType::Auto,
            bye: true,
        });
        entries.push(AuditEntry {
            seed,
            team_id: rec.team_id,
            bid: BidType::Auto,
            reason: format!(
                "{} champion, composite #{}, first-round bye",
                rec.conference, rec.rank
            ),
            displaced: None,
        });
    }

    for (i, rec) in at_large.iter().enumerate() {
        let seed = i as u8 + 5;
        slots.push(PlayoffSlot {
            team_id: rec.team_id,
            seed,
            bid: BidType::AtLarge,
            bye: false,
        });
        entries.push(AuditEntry {
            seed,
            team_id: rec.team_id,
            bid: BidType::AtLarge,
            reason: format!("at-large, composite #{}", rec.rank),
            displaced: None,
        });
    }

    slots.push(PlayoffSlot {
        team_id: fifth.team_id,
        seed: FIELD_SIZE as u8,
        bid: BidType::Auto,
        bye: false,
    });
    entries.push(AuditEntry {
        seed: FIELD_SIZE as u8,
        team_id: fifth.team_id,
        bid: BidType::Auto,
        reason: match displaced {
            Some(d) => format!(
                "{} champion, composite #{}, pulled in from outside the top 12, displacing team {d}",
                fifth.conference, fifth.rank
            ),
            None => format!("{} champion, composite #{}", fifth.conference, fifth.rank),
        },
        displaced,
    });

    let seeded: HashMap<u8, TeamId> = slots.iter().map(|s| (s.seed, s.team_id)).collect();
    let first_round = [(5u8, 12u8), (6, 11), (7, 10), (8, 9)]
        .iter()
        .map(|&(high, low)| Matchup {
            high_seed: high,
            low_seed: low,
            host: seeded[&high],
            visitor: seeded[&low],
        })
        .collect();

    Ok((PlayoffField { slots, first_round }, SelectionAudit { entries }))
}

/// Plain-text bracket summary for the CLI: byes, first-round hosts, and the
/// fixed quarterfinal routing (winners advance without reseeding).
pub fn render_bracket(field: &PlayoffField, names: &HashMap<TeamId, String>) -> String {
    let name = |id: TeamId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("team {id}"))
    };
    let mut out = String::new();
    let _ = writeln!(out, "FIRST ROUND BYES");
    for slot in field.slots.iter().filter(|s| s.bye) {
        let _ = writeln!(out, "  ({}) {}", slot.seed, name(slot.team_id));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "FIRST ROUND (campus sites)");
    for m in &field.first_round {
        let _ = writeln!(
            out,
            "  ({}) {} hosts ({}) {}",
            m.high_seed,
            name(m.host),
            m.low_seed,
            name(m.visitor)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "QUARTERFINALS (no reseeding)");
    let _ = writeln!(out, "  (1) vs winner of 8/9");
    let _ = writeln!(out, "  (2) vs winner of 7/10");
    let _ = writeln!(out, "  (3) vs winner of 6/11");
    let _ = writeln!(out, "  (4) vs winner of 5/12");
    out
}
