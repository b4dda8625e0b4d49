//! Reward data model: the tier partition of `[0, 1)` and pull outcomes.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A named band in the probability partition.
///
/// `threshold` is cumulative: a tier covers `[previous threshold, threshold)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTier {
    pub name: String,
    pub threshold: f64,
}

impl RewardTier {
    pub fn new(name: impl Into<String>, threshold: f64) -> Self {
        Self {
            name: name.into(),
            threshold,
        }
    }
}

/// A validated, immutable tier table.
///
/// Thresholds are strictly increasing and lie in `(0, 1]`. Whatever is left
/// between the last threshold and `1.0` is the "no reward" band. The first
/// tier (the rarest) is the top tier and is the one that pays out tickets.
#[derive(Debug, Clone)]
pub struct RewardTable {
    tiers: Vec<RewardTier>,
}

impl RewardTable {
    pub fn new(tiers: Vec<RewardTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(Error::RewardTable("at least one tier is required".into()));
        }

        let mut previous = 0.0_f64;
        for (i, tier) in tiers.iter().enumerate() {
            if tier.name.trim().is_empty() {
                return Err(Error::RewardTable(format!("tier {i} has an empty name")));
            }
            if tiers[..i].iter().any(|t| t.name == tier.name) {
                return Err(Error::RewardTable(format!(
                    "duplicate tier name `{}`",
                    tier.name
                )));
            }
            // NaN fails both comparisons below.
            if !(tier.threshold > 0.0 && tier.threshold <= 1.0) {
                return Err(Error::RewardTable(format!(
                    "tier `{}` threshold {} is outside (0, 1]",
                    tier.name, tier.threshold
                )));
            }
            if tier.threshold <= previous {
                return Err(Error::RewardTable(format!(
                    "tier `{}` threshold {} does not increase on {previous}",
                    tier.name, tier.threshold
                )));
            }
            previous = tier.threshold;
        }

        Ok(Self { tiers })
    }

    /// Tiers in ascending threshold order.
    pub fn tiers(&self) -> &[RewardTier] {
        &self.tiers
    }

    /// The rarest tier.
    pub fn top(&self) -> &RewardTier {
        &self.tiers[0]
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Reject a ticket pool that reuses a tier name, since a ticket and a
    /// tier hit would then serialize identically.
    pub fn ensure_distinct_from(&self, tickets: &[String]) -> Result<()> {
        match self
            .tiers
            .iter()
            .find(|t| tickets.iter().any(|id| *id == t.name))
        {
            Some(tier) => Err(Error::RewardTable(format!(
                "tier name `{}` is also a ticket id in the pool",
                tier.name
            ))),
            None => Ok(()),
        }
    }

    /// Width of the trailing "no reward" band.
    pub fn miss_probability(&self) -> f64 {
        1.0 - self.tiers[self.tiers.len() - 1].threshold
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of a single sampling trial.
///
/// Serializes as a bare JSON string (ticket id or tier label) or `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Ticket(String),
    Tier(String),
    None,
}

impl PullOutcome {
    pub fn is_ticket(&self) -> bool {
        matches!(self, PullOutcome::Ticket(_))
    }
}

impl Serialize for PullOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PullOutcome::Ticket(id) => serializer.serialize_str(id),
            PullOutcome::Tier(name) => serializer.serialize_str(name),
            PullOutcome::None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_increasing_thresholds() {
        let table = RewardTable::new(vec![
            RewardTier::new("ticket", 0.001),
            RewardTier::new("ssr", 0.05),
            RewardTier::new("r", 1.0),
        ])
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.top().name, "ticket");
        assert_eq!(table.miss_probability(), 0.0);
    }

    #[test]
    fn tier_names_must_not_collide_with_tickets() {
        let table = RewardTable::new(vec![
            RewardTier::new("ticket", 0.01),
            RewardTier::new("sr", 0.2),
        ])
        .unwrap();
        assert!(table
            .ensure_distinct_from(&["T-1".into(), "T-2".into()])
            .is_ok());

        let err = table
            .ensure_distinct_from(&["T-1".into(), "sr".into()])
            .unwrap_err();
        assert!(err.to_string().contains("`sr`"));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(RewardTable::new(vec![]).is_err());
    }

    #[test]
    fn rejects_non_increasing_thresholds() {
        let err = RewardTable::new(vec![
            RewardTier::new("a", 0.2),
            RewardTier::new("b", 0.2),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("does not increase"));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        assert!(RewardTable::new(vec![RewardTier::new("a", 0.0)]).is_err());
        assert!(RewardTable::new(vec![RewardTier::new("a", 1.5)]).is_err());
        assert!(RewardTable::new(vec![RewardTier::new("a", f64::NAN)]).is_err());
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        assert!(RewardTable::new(vec![
            RewardTier::new("a", 0.1),
            RewardTier::new("a", 0.2),
        ])
        .is_err());
        assert!(RewardTable::new(vec![RewardTier::new(" ", 0.1)]).is_err());
    }

    #[test]
    fn outcome_serializes_as_bare_value() {
        let outcomes = vec![
            PullOutcome::Ticket("T-1".into()),
            PullOutcome::Tier("ssr".into()),
            PullOutcome::None,
        ];
        let json = serde_json::to_string(&outcomes).unwrap();
        assert_eq!(json, r#"["T-1","ssr",null]"#);
    }
}
