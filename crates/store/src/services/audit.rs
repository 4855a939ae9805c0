//! Append-only audit trail.
//!
//! Every state-changing service writes its audit entries through here,
//! inside the same transaction as the change itself. A change and its
//! audit entry commit together or not at all.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::records::AuditLogEntry;
use crate::store::{StoreError, StoreTxn};

/// Writer and reader for the audit trail.
pub struct AuditTrail;

impl AuditTrail {
    /// Appends an audit entry recording a change to an entity.
    ///
    /// `before` is `None` for creations. Snapshots are serialized as
    /// JSON so the trail stays readable without the record types.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Integrity` if a snapshot cannot be
    /// serialized, or the store's error if the append fails.
    pub async fn append<T, B, A>(
        txn: &mut T,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        actor_id: Uuid,
        before: Option<&B>,
        after: Option<&A>,
    ) -> Result<(), StoreError>
    where
        T: StoreTxn,
        B: Serialize + Sync,
        A: Serialize + Sync,
    {
        let before = before
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Integrity(format!("Audit snapshot serialization: {e}")))?;
        let after = after
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Integrity(format!("Audit snapshot serialization: {e}")))?;

        txn.append_audit(AuditLogEntry {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            actor_id,
            before,
            after,
            created_at: Utc::now(),
        })
        .await
    }

    /// Reads the audit trail for an entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the read fails.
    pub async fn entries_for<T: StoreTxn>(
        txn: &T,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        txn.audit_for(entity_type, entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TransactionalStore};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = MemoryStore::new();
        let entity_id = Uuid::new_v4();
        let actor_id = Uuid::new_v4();

        let mut txn = store.begin().await.unwrap();
        AuditTrail::append(
            &mut txn,
            "receivable",
            entity_id,
            "payment_registered",
            actor_id,
            Some(&json!({ "paid_amount": dec!(0) })),
            Some(&json!({ "paid_amount": dec!(5000) })),
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let txn = store.begin().await.unwrap();
        let entries = AuditTrail::entries_for(&txn, "receivable", entity_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "payment_registered");
        assert_eq!(entries[0].actor_id, actor_id);
        assert!(entries[0].before.is_some());
        assert!(entries[0].after.is_some());
    }

    #[tokio::test]
    async fn test_creation_has_no_before_snapshot() {
        let store = MemoryStore::new();
        let entity_id = Uuid::new_v4();

        let mut txn = store.begin().await.unwrap();
        AuditTrail::append(
            &mut txn,
            "payable",
            entity_id,
            "created",
            Uuid::new_v4(),
            None::<&serde_json::Value>,
            Some(&json!({ "total_amount": dec!(1000) })),
        )
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let txn = store.begin().await.unwrap();
        let entries = AuditTrail::entries_for(&txn, "payable", entity_id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].before.is_none());
    }
}
