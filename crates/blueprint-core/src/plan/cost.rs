//! Cost estimation.
//!
//! A [`CostBreakdown`] can only be built through its constructors, which
//! compute `total` as the sum of the five components. Deserialization goes
//! through the same path, so a stored or model-supplied total is ignored.

use serde::{Deserialize, Serialize};

use super::types::Feature;

pub const DEFAULT_HOURLY_RATE: u64 = 75;
pub const DEFAULT_CURRENCY: &str = "USD";

// Shares of the development cost, in percent.
const DESIGN_PCT: u64 = 20;
const TESTING_PCT: u64 = 15;
const DEPLOYMENT_PCT: u64 = 5;
const MAINTENANCE_PCT: u64 = 10;

/// Hourly rate and currency used to turn hours into money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostModel {
    pub hourly_rate: u64,
    pub currency: String,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            hourly_rate: DEFAULT_HOURLY_RATE,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl CostModel {
    pub fn new(hourly_rate: u64, currency: impl Into<String>) -> Self {
        Self {
            hourly_rate,
            currency: currency.into(),
        }
    }

    /// Cost of building `features` at this rate.
    pub fn estimate(&self, features: &[Feature]) -> CostBreakdown {
        let hours = features
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(u64::from(f.estimated_hours)));
        CostBreakdown::from_development(hours.saturating_mul(self.hourly_rate), &self.currency)
    }
}

/// Money breakdown in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CostParts")]
pub struct CostBreakdown {
    development: u64,
    design: u64,
    testing: u64,
    deployment: u64,
    maintenance: u64,
    total: u64,
    currency: String,
}

impl CostBreakdown {
    /// Derive every other component from the development cost.
    pub fn from_development(development: u64, currency: &str) -> Self {
        Self::from_parts(
            development,
            share(development, DESIGN_PCT),
            share(development, TESTING_PCT),
            share(development, DEPLOYMENT_PCT),
            share(development, MAINTENANCE_PCT),
            currency,
        )
    }

    pub fn from_parts(
        development: u64,
        design: u64,
        testing: u64,
        deployment: u64,
        maintenance: u64,
        currency: &str,
    ) -> Self {
        Self {
            development,
            design,
            testing,
            deployment,
            maintenance,
            total: sum(&[development, design, testing, deployment, maintenance]),
            currency: currency.to_string(),
        }
    }

    pub fn development(&self) -> u64 {
        self.development
    }

    pub fn design(&self) -> u64 {
        self.design
    }

    pub fn testing(&self) -> u64 {
        self.testing
    }

    pub fn deployment(&self) -> u64 {
        self.deployment
    }

    pub fn maintenance(&self) -> u64 {
        self.maintenance
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// True when `total` equals the sum of the components.
    pub fn is_balanced(&self) -> bool {
        self.total
            == sum(&[
                self.development,
                self.design,
                self.testing,
                self.deployment,
                self.maintenance,
            ])
    }
}

fn share(development: u64, pct: u64) -> u64 {
    u64::try_from(u128::from(development) * u128::from(pct) / 100).unwrap_or(u64::MAX)
}

/// Saturating sum; totals pin at `u64::MAX` rather than wrap.
fn sum(parts: &[u64]) -> u64 {
    parts.iter().fold(0, |acc, p| acc.saturating_add(*p))
}

/// Wire form of a cost breakdown. `total` is accepted and dropped.
#[derive(Deserialize)]
#[serde(default)]
struct CostParts {
    development: u64,
    design: u64,
    testing: u64,
    deployment: u64,
    maintenance: u64,
    #[allow(dead_code)]
    total: u64,
    currency: String,
}

impl Default for CostParts {
    fn default() -> Self {
        Self {
            development: 0,
            design: 0,
            testing: 0,
            deployment: 0,
            maintenance: 0,
            total: 0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl From<CostParts> for CostBreakdown {
    fn from(p: CostParts) -> Self {
        Self::from_parts(
            p.development,
            p.design,
            p.testing,
            p.deployment,
            p.maintenance,
            &p.currency,
        )
    }
}
