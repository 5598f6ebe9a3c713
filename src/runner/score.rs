//! Final score and rank evaluation.

use super::state::{RunEnd, RunState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the final score counts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Points from collected items.
    #[default]
    Collected,
    /// Whole seconds survived.
    Survival,
}

/// A grade and its flavour text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub grade: &'static str,
    pub label: &'static str,
}

/// Inclusive upper bound of a tier, or `None` for the top tier.
type Tier = (Option<u32>, Rank);

const fn tier(max: Option<u32>, grade: &'static str, label: &'static str) -> Tier {
    (max, Rank { grade, label })
}

const COLLECTED_TIERS: &[Tier] = &[
    tier(Some(10), "F", "lolol"),
    tier(Some(20), "D", "Clumsy Collector"),
    tier(Some(30), "C", "Still Learning"),
    tier(Some(40), "C+", "Not Bad"),
    tier(Some(50), "B", "Pretty Good"),
    tier(Some(60), "B+", "Poop Enthusiast"),
    tier(Some(70), "A", "Nice Run!"),
    tier(Some(80), "A+", "Professional Pooper"),
    tier(Some(90), "S", "Legendary Poop"),
    tier(Some(99), "S+", "Almost God"),
    tier(None, "SS", "Poop Overlord"),
];

const SURVIVAL_TIERS: &[Tier] = &[
    tier(Some(10), "F", "Tripped at the Start"),
    tier(Some(20), "D", "Sunday Jogger"),
    tier(Some(30), "C", "Street Runner"),
    tier(Some(45), "B", "Gap Hopper"),
    tier(Some(60), "A", "Fire Dodger"),
    tier(Some(90), "S", "Marathon Cleaner"),
    tier(None, "SS", "Endless Runner"),
];

impl ScoringMode {
    fn tiers(&self) -> &'static [Tier] {
        match self {
            Self::Collected => COLLECTED_TIERS,
            Self::Survival => SURVIVAL_TIERS,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Collected => "poop",
            Self::Survival => "s",
        }
    }
}

/// Map a score to its tier: the first whose upper bound is at least the
/// score.
pub fn evaluate_rank(mode: ScoringMode, score: u32) -> Rank {
    let tiers = mode.tiers();
    tiers
        .iter()
        .find(|(max, _)| max.map_or(true, |max| score <= max))
        .or_else(|| tiers.last())
        .map(|(_, rank)| *rank)
        .unwrap_or(Rank {
            grade: "F",
            label: "",
        })
}

/// Score of a finished run in the given mode.
pub fn final_score(mode: ScoringMode, run: &RunState) -> u32 {
    match mode {
        ScoringMode::Collected => run.collected,
        ScoringMode::Survival => u32::try_from(run.elapsed.as_secs()).unwrap_or(u32::MAX),
    }
}

/// Everything the result screen and the leaderboard need about a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub score: u32,
    pub rank: Rank,
    pub mode: ScoringMode,
    pub reason: RunEnd,
    pub elapsed: Duration,
    pub collected: u32,
    pub display_name: String,
}

impl RunResult {
    pub fn evaluate(mode: ScoringMode, run: &RunState, reason: RunEnd, display_name: &str) -> Self {
        let score = final_score(mode, run);
        Self {
            score,
            rank: evaluate_rank(mode, score),
            mode,
            reason,
            elapsed: run.elapsed,
            collected: run.collected,
            display_name: display_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_boundaries() {
        let cases = [
            (0, "F"),
            (10, "F"),
            (11, "D"),
            (20, "D"),
            (31, "C+"),
            (42, "B"),
            (60, "B+"),
            (75, "A+"),
            (90, "S"),
            (99, "S+"),
            (100, "SS"),
            (5000, "SS"),
        ];
        for (score, grade) in cases {
            assert_eq!(evaluate_rank(ScoringMode::Collected, score).grade, grade, "score {score}");
        }
    }

    #[test]
    fn test_rank_labels() {
        assert_eq!(evaluate_rank(ScoringMode::Collected, 3).label, "lolol");
        assert_eq!(evaluate_rank(ScoringMode::Collected, 42).label, "Pretty Good");
        assert_eq!(evaluate_rank(ScoringMode::Collected, 120).label, "Poop Overlord");
    }

    #[test]
    fn test_survival_boundaries() {
        assert_eq!(evaluate_rank(ScoringMode::Survival, 10).grade, "F");
        assert_eq!(evaluate_rank(ScoringMode::Survival, 45).grade, "B");
        assert_eq!(evaluate_rank(ScoringMode::Survival, 46).grade, "A");
        assert_eq!(evaluate_rank(ScoringMode::Survival, 91).grade, "SS");
    }

    #[test]
    fn test_final_score_per_mode() {
        let mut run = RunState::new(0.3);
        run.collected = 42;
        run.elapsed = Duration::from_millis(37_900);
        assert_eq!(final_score(ScoringMode::Collected, &run), 42);
        assert_eq!(final_score(ScoringMode::Survival, &run), 37);
    }

    #[test]
    fn test_result_for_forty_two_points() {
        let mut run = RunState::new(0.3);
        run.collected = 42;
        let result = RunResult::evaluate(ScoringMode::Collected, &run, RunEnd::HazardHit, "Kei#JP");
        assert_eq!(result.score, 42);
        assert_eq!(result.rank.grade, "B");
        assert_eq!(result.rank.label, "Pretty Good");
        assert_eq!(result.display_name, "Kei#JP");
    }

    #[test]
    fn test_scoring_mode_serde() {
        let json = serde_json::to_string(&ScoringMode::Survival).unwrap();
        assert_eq!(json, "\"survival\"");
        let mode: ScoringMode = serde_json::from_str("\"collected\"").unwrap();
        assert_eq!(mode, ScoringMode::Collected);
    }
}
