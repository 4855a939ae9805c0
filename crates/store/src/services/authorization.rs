//! The manager authorization gate.
//!
//! Disbursements at or above a branch's configured limit must carry a
//! manager approval before they commit. The gate runs inside the
//! caller's transaction so the threshold it reads is the one the commit
//! will see.

use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use travesia_core::authorization::{AuthorizationPolicy, AuthorizationRequest};

use crate::store::{StoreError, StoreTxn};

/// Fail-closed authorization gate for outgoing money.
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Returns true if the amount needs manager approval at this branch.
    ///
    /// A branch with no configuration requires approval for every
    /// amount.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the branch configuration read fails.
    pub async fn check_authorization_required<T: StoreTxn>(
        txn: &T,
        branch_id: Uuid,
        amount: Decimal,
    ) -> Result<bool, StoreError> {
        let limit = Self::branch_limit(txn, branch_id).await?;
        Ok(AuthorizationPolicy::requires_approval(limit, amount))
    }

    /// Evaluates a disbursement against the branch threshold.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the branch configuration read fails.
    pub async fn evaluate<T: StoreTxn>(
        txn: &T,
        branch_id: Uuid,
        amount: Decimal,
        approver_id: Option<Uuid>,
    ) -> Result<AuthorizationRequest, StoreError> {
        let limit = Self::branch_limit(txn, branch_id).await?;
        Ok(AuthorizationPolicy::evaluate(
            branch_id, limit, amount, approver_id,
        ))
    }

    async fn branch_limit<T: StoreTxn>(
        txn: &T,
        branch_id: Uuid,
    ) -> Result<Option<Decimal>, StoreError> {
        let config = txn.branch_config(branch_id).await?;
        if config.is_none() {
            warn!(%branch_id, "No branch configuration found, authorization gate fails closed");
        }
        Ok(config.map(|c| c.manager_authorization_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BranchConfig;
    use crate::store::{MemoryStore, TransactionalStore};
    use rust_decimal_macros::dec;
    use travesia_core::authorization::AuthorizationStatus;

    async fn store_with_limit(branch_id: Uuid, limit: Decimal) -> MemoryStore {
        let store = MemoryStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.put_branch_config(BranchConfig {
            branch_id,
            manager_authorization_limit: limit,
        })
        .await
        .unwrap();
        txn.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_below_limit_passes() {
        let branch_id = Uuid::new_v4();
        let store = store_with_limit(branch_id, dec!(5000)).await;

        let txn = store.begin().await.unwrap();
        let required =
            AuthorizationGate::check_authorization_required(&txn, branch_id, dec!(4999.99))
                .await
                .unwrap();
        assert!(!required);
    }

    #[tokio::test]
    async fn test_at_limit_requires_approval() {
        let branch_id = Uuid::new_v4();
        let store = store_with_limit(branch_id, dec!(5000)).await;

        let txn = store.begin().await.unwrap();
        let required =
            AuthorizationGate::check_authorization_required(&txn, branch_id, dec!(5000))
                .await
                .unwrap();
        assert!(required);
    }

    #[tokio::test]
    async fn test_unconfigured_branch_fails_closed() {
        let store = MemoryStore::new();
        let txn = store.begin().await.unwrap();

        let required =
            AuthorizationGate::check_authorization_required(&txn, Uuid::new_v4(), dec!(0.01))
                .await
                .unwrap();
        assert!(required);
    }

    #[tokio::test]
    async fn test_evaluate_with_approver() {
        let branch_id = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let store = store_with_limit(branch_id, dec!(5000)).await;

        let txn = store.begin().await.unwrap();
        let request = AuthorizationGate::evaluate(&txn, branch_id, dec!(8000), Some(approver))
            .await
            .unwrap();
        assert_eq!(request.status, AuthorizationStatus::Approved);
        assert_eq!(request.threshold, Some(dec!(5000)));
    }
}
