pub mod auth;
pub mod job;
pub mod offering;
pub mod rating;
pub mod user;

use mongodb::ClientSession;
use mongodb::bson::{doc, oid::ObjectId};

use crate::db::DbConn;
use crate::models::Job;
use crate::utils::ApiError;

pub(crate) fn parse_id(id: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}

/// Opens a client session with a transaction already started. Lifecycle and
/// settlement handlers run their read-check-write sequence inside one of
/// these so the state change and its notification land together.
pub(crate) async fn start_transaction(db: &DbConn) -> Result<ClientSession, ApiError> {
    let mut session = db
        .client
        .start_session(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to open session: {}", e)))?;
    session
        .start_transaction(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to start transaction: {}", e)))?;
    Ok(session)
}

pub(crate) async fn commit(mut session: ClientSession) -> Result<(), ApiError> {
    session
        .commit_transaction()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to commit transaction: {}", e)))
}

pub(crate) async fn load_job_in_session(
    db: &DbConn,
    session: &mut ClientSession,
    job_id: ObjectId,
) -> Result<Job, ApiError> {
    db.collection::<Job>("jobs")
        .find_one_with_session(doc! { "_id": job_id }, None, session)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))
}
