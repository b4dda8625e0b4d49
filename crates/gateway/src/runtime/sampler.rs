//! Tier sampling and ticket pool draws.

use gacha_domain::reward::{RewardTable, RewardTier};

use super::random::RandomSource;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RewardSampler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Maps a uniform draw onto the tier partition.
#[derive(Debug, Clone)]
pub struct RewardSampler {
    table: RewardTable,
}

impl RewardSampler {
    pub fn new(table: RewardTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RewardTable {
        &self.table
    }

    /// Draw one value and return the tier it lands in, or `None` for the
    /// trailing no-reward band.
    pub fn sample(&self, rng: &dyn RandomSource) -> Option<&RewardTier> {
        self.locate(rng.next_unit())
    }

    /// First tier whose threshold exceeds `p` (`p < threshold`).
    pub fn locate(&self, p: f64) -> Option<&RewardTier> {
        let tiers = self.table.tiers();
        let idx = tiers.partition_point(|t| t.threshold <= p);
        tiers.get(idx)
    }

    pub fn is_top(&self, tier: &RewardTier) -> bool {
        tier.name == self.table.top().name
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TicketPool
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Prize identifiers paid out by the top tier.  Draws are with replacement.
#[derive(Debug, Clone, Default)]
pub struct TicketPool {
    tickets: Vec<String>,
}

impl TicketPool {
    pub fn new(tickets: Vec<String>) -> Self {
        Self { tickets }
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn contains(&self, ticket: &str) -> bool {
        self.tickets.iter().any(|t| t == ticket)
    }

    /// Pick one ticket uniformly; `None` when the pool is empty.
    pub fn draw(&self, rng: &dyn RandomSource) -> Option<String> {
        if self.tickets.is_empty() {
            return None;
        }
        let idx = (rng.next_unit() * self.tickets.len() as f64) as usize;
        // Guards against a source returning exactly 1.0.
        let idx = idx.min(self.tickets.len() - 1);
        Some(self.tickets[idx].clone())
    }
}
