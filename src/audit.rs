use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{entities::audit_log, errors::ServiceError};

/// Writes an audit row for an accepted status transition. Called inside the
/// same transaction as the status write so the trail cannot diverge from the
/// order state.
pub async fn record_transition<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    actor: &str,
    action: &str,
    before_status: &str,
    after_status: &str,
    detail: Option<String>,
) -> Result<(), ServiceError> {
    let entry = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        actor: Set(actor.to_string()),
        action: Set(action.to_string()),
        before_status: Set(before_status.to_string()),
        after_status: Set(after_status.to_string()),
        detail: Set(detail),
        created_at: Set(Utc::now()),
    };

    entry.insert(conn).await?;
    Ok(())
}
