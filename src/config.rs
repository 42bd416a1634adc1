use serde::{Deserialize, Serialize};

use crate::error::RankingError;

/// Relative weight of each rater family in the composite score.
/// Weights must sum to 1.0 (checked by `RankingConfig::validate`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub resume: f64,
    pub predictive: f64,
    pub sor: f64,
    pub sos: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            resume: 0.30,
            predictive: 0.40,
            sor: 0.15,
            sos: 0.15,
        }
    }
}

/// Policy for deciding a conference championship game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ChampWinnerPolicy {
    /// The higher composite-ranked participant wins. Deterministic, no RNG.
    HigherComposite,
    /// Draw the winner from a logistic model on the composite gap,
    /// seeded so the same input always produces the same champion.
    Simulated { seed: u64 },
}

impl Default for ChampWinnerPolicy {
    fn default() -> Self {
        Self::HigherComposite
    }
}

/// One analysis run owns one config instance. There is no process-wide
/// current-season state anywhere in the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Games before this week are excluded (early-season noise).
    pub start_week: u8,
    /// Margin-of-victory cap in points.
    pub mov_cap: f64,
    /// Home field advantage in points, removed from margins at neutralization.
    pub hfa_points: f64,
    pub elo_k_factor: f64,
    /// Fraction of a prior closing rating carried into the new season.
    pub elo_mean_regression: f64,
    /// Scale of the logistic MOV multiplier inside Elo updates.
    pub elo_mov_scale: f64,
    pub composite_weights: CompositeWeights,
    /// Composite gap below which the tie-break waterfall engages.
    pub tie_threshold: f64,
    pub champ_winner: ChampWinnerPolicy,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            start_week: 5,
            mov_cap: 28.0,
            hfa_points: 3.75,
            elo_k_factor: 32.0,
            elo_mean_regression: 0.67,
            elo_mov_scale: 17.0,
            composite_weights: CompositeWeights::default(),
            tie_threshold: 0.01,
            champ_winner: ChampWinnerPolicy::default(),
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), RankingError> {
        let w = &self.composite_weights;
        let sum = w.resume + w.predictive + w.sor + w.sos;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(RankingError::Validation(format!(
                "composite weights must sum to 1.0, got {sum:.6}"
            )));
        }
        if self.mov_cap <= 0.0 {
            return Err(RankingError::Validation(format!(
                "mov_cap must be positive, got {}",
                self.mov_cap
            )));
        }
        if !(0.0..=1.0).contains(&self.elo_mean_regression) {
            return Err(RankingError::Validation(format!(
                "elo_mean_regression must be in [0, 1], got {}",
                self.elo_mean_regression
            )));
        }
        if self.tie_threshold < 0.0 {
            return Err(RankingError::Validation(format!(
                "tie_threshold must be non-negative, got {}",
                self.tie_threshold
            )));
        }
        Ok(())
    }
}
