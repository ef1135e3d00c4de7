use rand::Rng;

use super::Difficulty;

/// Number of picks kept before the history starts over
pub const HISTORY_WINDOW: usize = 10;

/// Picks question difficulties so the three tiers stay roughly evenly represented.
///
/// A tier is eligible when its count in the current window is below
/// `(len + 1) / 3`. The pick is uniform among eligible tiers, or among all three
/// when none is eligible. Once the window holds [`HISTORY_WINDOW`] entries the
/// next pick starts from an empty history.
#[derive(Debug, Clone, Default)]
pub struct DifficultyBalancer {
    history: Vec<Difficulty>,
}

impl DifficultyBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: Vec<Difficulty>) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &[Difficulty] {
        &self.history
    }

    /// Tiers that may be picked next given the current history
    pub fn eligible(&self) -> Vec<Difficulty> {
        let threshold = (self.history.len() + 1) as f64 / 3.0;

        let eligible: Vec<Difficulty> = Difficulty::ALL
            .into_iter()
            .filter(|tier| (self.count(*tier) as f64) < threshold)
            .collect();

        if eligible.is_empty() {
            Difficulty::ALL.to_vec()
        } else {
            eligible
        }
    }

    /// Choose the next tier and record it
    pub fn next_difficulty<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Difficulty {
        if self.history.len() >= HISTORY_WINDOW {
            self.history.clear();
        }

        let eligible = self.eligible();
        let picked = eligible[rng.gen_range(0..eligible.len())];
        self.history.push(picked);
        picked
    }

    fn count(&self, tier: Difficulty) -> usize {
        self.history.iter().filter(|d| **d == tier).count()
    }
}
