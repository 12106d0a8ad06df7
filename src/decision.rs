//! Decision Policy
//!
//! Maps a fraud probability onto a binary label and a risk tier.
//! The label threshold doubles as the upper risk-tier boundary.

use serde::{Deserialize, Serialize};

/// Default probability at or above which a transaction is labelled fraudulent.
/// Also the boundary above which the high-risk tier starts.
pub const LABEL_THRESHOLD: f64 = 0.8;

/// Probability above which the medium-risk tier starts
pub const MEDIUM_RISK_FLOOR: f64 = 0.5;

/// Binary outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Fraudulent")]
    Fraudulent,
    #[serde(rename = "Non-Fraudulent")]
    NonFraudulent,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fraudulent => "Fraudulent",
            Label::NonFraudulent => "Non-Fraudulent",
        }
    }
}

/// Risk band used to pick the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskTier::High => "High risk: immediately verify the transaction or block the card.",
            RiskTier::Medium => {
                "Medium risk: consider additional authentication or user verification."
            }
            RiskTier::Low => "Low risk: transaction appears normal; continue monitoring.",
        }
    }
}

/// Rejected threshold value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("label threshold must be within (0, 1], got {0}")]
pub struct InvalidThreshold(pub f64);

/// Outcome of applying the policy to one probability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub label: Label,
    pub tier: RiskTier,
}

impl Decision {
    pub fn recommendation(&self) -> &'static str {
        self.tier.recommendation()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: LABEL_THRESHOLD,
        }
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Label is inclusive at the threshold; the high tier is exclusive.
    /// A probability equal to the threshold is Fraudulent with a medium-risk recommendation.
    pub fn decide(&self, probability: f64) -> Decision {
        let label = if probability >= self.threshold {
            Label::Fraudulent
        } else {
            Label::NonFraudulent
        };

        let tier = if probability > self.threshold {
            RiskTier::High
        } else if probability > MEDIUM_RISK_FLOOR {
            RiskTier::Medium
        } else {
            RiskTier::Low
        };

        Decision { label, tier }
    }
}
