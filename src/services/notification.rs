use mongodb::ClientSession;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use log::warn;

use crate::db::DbConn;
use crate::models::User;

/// In-app notifications: an ordered list of strings on the user document
/// plus a "something new" flag the client polls.
pub struct NotificationService;

impl NotificationService {
    /// Appends a notification inside an open transaction. Lifecycle
    /// transitions use this so the state write and the notification land
    /// together or not at all.
    pub async fn push_with_session(
        db: &DbConn,
        session: &mut ClientSession,
        user_id: &ObjectId,
        text: &str,
    ) -> Result<(), mongodb::error::Error> {
        db.collection::<User>("users")
            .update_one_with_session(
                doc! { "_id": user_id },
                doc! {
                    "$push": { "notifications": text },
                    "$set": { "new_notifications": true, "updated_at": DateTime::now() }
                },
                None,
                session,
            )
            .await?;
        Ok(())
    }

    /// Best-effort variant for writes outside a transaction.
    pub async fn push(db: &DbConn, user_id: &ObjectId, text: &str) {
        let result = db
            .collection::<User>("users")
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$push": { "notifications": text },
                    "$set": { "new_notifications": true, "updated_at": DateTime::now() }
                },
                None,
            )
            .await;

        if let Err(e) = result {
            warn!("Failed to push notification to {}: {}", user_id.to_hex(), e);
        }
    }

    pub fn accepted_text(job_title: &str) -> String {
        format!("You were accepted for the job \"{}\". Time to get to work!", job_title)
    }

    pub fn completed_text(job_title: &str, payment: i64) -> String {
        format!(
            "The job \"{}\" was marked completed. You have {} credit to spend with the hirer.",
            job_title, payment
        )
    }

    pub fn rated_text(job_title: &str, value: i32) -> String {
        format!("You received a {}/5 rating for the job \"{}\".", value, job_title)
    }

    pub fn purchase_text(description: &str, quantity: i64, total: i64) -> String {
        format!(
            "Someone redeemed {} x \"{}\" for {} credit.",
            quantity, description, total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_texts_mention_the_job() {
        assert!(NotificationService::accepted_text("Fence repair").contains("Fence repair"));
        assert!(NotificationService::completed_text("Fence repair", 100).contains("100"));
        assert!(NotificationService::rated_text("Fence repair", 4).contains("4/5"));
    }

    #[test]
    fn purchase_text_carries_quantity_and_total() {
        let text = NotificationService::purchase_text("Guitar lesson", 2, 60);
        assert!(text.contains("2 x"));
        assert!(text.contains("60"));
    }
}
