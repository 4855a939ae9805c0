//! Manager authorization threshold decisions.
//!
//! Pure policy only: loading the branch configuration is the store
//! layer's job. Missing configuration is treated as "authorization
//! required" (fail-closed) so that a misconfigured branch can never
//! silently permit an unauthorized disbursement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of an authorization evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// Below the branch threshold; no approval needed.
    NotRequired,
    /// Approval needed and no approver supplied yet.
    Pending,
    /// Approval needed and an approver was supplied.
    Approved,
}

/// A record of an authorization decision for an amount at a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// The branch the disbursement belongs to.
    pub branch_id: Uuid,
    /// The amount under evaluation.
    pub amount: Decimal,
    /// The branch's manager-authorization limit, if configured.
    pub threshold: Option<Decimal>,
    /// The manager who approved, when approval was supplied.
    pub approver_id: Option<Uuid>,
    /// The decision outcome.
    pub status: AuthorizationStatus,
}

/// Stateless authorization policy.
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Returns true if the amount requires manager approval.
    ///
    /// `limit` is the branch's configured threshold; `None` means the
    /// branch configuration could not be found and the gate fails
    /// closed.
    #[must_use]
    pub fn requires_approval(limit: Option<Decimal>, amount: Decimal) -> bool {
        match limit {
            Some(limit) => amount >= limit,
            None => true,
        }
    }

    /// Evaluates an amount against a branch threshold.
    #[must_use]
    pub fn evaluate(
        branch_id: Uuid,
        limit: Option<Decimal>,
        amount: Decimal,
        approver_id: Option<Uuid>,
    ) -> AuthorizationRequest {
        let status = if !Self::requires_approval(limit, amount) {
            AuthorizationStatus::NotRequired
        } else if approver_id.is_some() {
            AuthorizationStatus::Approved
        } else {
            AuthorizationStatus::Pending
        };

        AuthorizationRequest {
            branch_id,
            amount,
            threshold: limit,
            approver_id,
            status,
        }
    }
}
