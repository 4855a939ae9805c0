//! Refund calculation rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use travesia_shared::types::money::round2;

/// The refund tier selected for a cancellation.
///
/// Tiers are keyed on lead time: days between the cancellation request
/// and the scheduled departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    /// 30 or more days before departure: full refund.
    Full,
    /// 14-29 days before departure: 90% refund.
    Early,
    /// 7-13 days before departure: 75% refund.
    Moderate,
    /// 2-6 days before departure: 50% refund.
    Late,
    /// 0-1 days before departure: no refund.
    LastMinute,
}

impl RefundTier {
    /// Selects the tier for a given lead time.
    ///
    /// Lead times past departure (negative) fall into the last-minute
    /// tier.
    #[must_use]
    pub fn for_lead_time(days_before_departure: i64) -> Self {
        match days_before_departure {
            d if d >= 30 => Self::Full,
            14..=29 => Self::Early,
            7..=13 => Self::Moderate,
            2..=6 => Self::Late,
            _ => Self::LastMinute,
        }
    }

    /// The refund percentage for this tier.
    #[must_use]
    pub fn percentage(&self) -> Decimal {
        match self {
            Self::Full => Decimal::from(100u32),
            Self::Early => Decimal::from(90u32),
            Self::Moderate => Decimal::from(75u32),
            Self::Late => Decimal::from(50u32),
            Self::LastMinute => Decimal::ZERO,
        }
    }

    /// Returns the string representation of the tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Early => "early",
            Self::Moderate => "moderate",
            Self::Late => "late",
            Self::LastMinute => "last_minute",
        }
    }
}

/// Result of a refund calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBreakdown {
    /// Amount returned to the customer.
    pub refund_amount: Decimal,
    /// Amount the business retains.
    pub retained_amount: Decimal,
    /// The percentage applied.
    pub refund_percentage: Decimal,
    /// The tier that produced the split.
    pub policy_applied: RefundTier,
}

/// Deterministic refund policy engine.
///
/// Pure calculation with no I/O so it is reusable from both the
/// cancellation and quoting flows.
pub struct RefundPolicy;

impl RefundPolicy {
    /// Computes the refund/retention split for a cancellation.
    ///
    /// The refund is rounded to 2 decimal places; the retained amount is
    /// the exact remainder (never independently rounded) so the two
    /// always sum to `total_paid`.
    #[must_use]
    pub fn calculate_refund(days_before_departure: i64, total_paid: Decimal) -> RefundBreakdown {
        let tier = RefundTier::for_lead_time(days_before_departure);
        let percentage = tier.percentage();

        let refund_amount = round2(total_paid * percentage / Decimal::from(100u32));
        let retained_amount = total_paid - refund_amount;

        RefundBreakdown {
            refund_amount,
            retained_amount,
            refund_percentage: percentage,
            policy_applied: tier,
        }
    }
}
