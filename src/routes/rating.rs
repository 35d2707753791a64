use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::ClientSession;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use validator::Validate;
use crate::db::DbConn;
use crate::models::{CreateRatingDto, Rating, RatingResponse};
use crate::guards::AuthGuard;
use crate::routes::{commit, load_job_in_session, parse_id, start_transaction};
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};

/// --------------------
/// Rate a completed job
/// --------------------
#[openapi(tag = "Rating")]
#[post("/profile/rate", data = "<dto>")]
pub async fn rate_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateRatingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    dto.validate()
        .map_err(|_| ApiError::bad_request("Rating must be between 1 and 5"))?;

    let job_id = parse_id(&dto.job_id, "job")?;

    let mut session = start_transaction(db).await?;
    let outcome = rate_in_txn(db, &mut session, &auth, job_id, &dto).await;

    match outcome {
        Ok(rating_id) => {
            commit(session).await?;
            Ok(Json(ApiResponse::success_with_message(
                "Rating submitted".to_string(),
                serde_json::json!({ "rating_id": rating_id.to_hex() }),
            )))
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            Err(e)
        }
    }
}

async fn rate_in_txn(
    db: &DbConn,
    session: &mut ClientSession,
    auth: &AuthGuard,
    job_id: ObjectId,
    dto: &CreateRatingDto,
) -> Result<ObjectId, ApiError> {
    let job = load_job_in_session(db, session, job_id).await?;
    let (rating_type, ratee_id) = job.ensure_can_rate(&auth.user_id)?;

    let existing = db.collection::<Rating>("ratings")
        .find_one_with_session(
            doc! { "job_id": job_id, "type": rating_type.as_str() },
            None,
            session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::conflict("You have already rated this job"));
    }

    let rating = Rating {
        id: None,
        value: dto.value,
        text: dto.text.clone(),
        rating_type,
        from_id: auth.user_id,
        to_id: ratee_id,
        job_id,
        created_at: DateTime::now(),
    };

    let result = db.collection::<Rating>("ratings")
        .insert_one_with_session(&rating, None, session)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save rating: {}", e)))?;

    NotificationService::push_with_session(
        db,
        session,
        &ratee_id,
        &NotificationService::rated_text(&job.title, dto.value),
    )
    .await
    .map_err(|e| ApiError::internal_error(format!("Failed to notify user: {}", e)))?;

    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid rating ID"))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct RatingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// --------------------
/// Ratings received by a user
/// --------------------
#[openapi(tag = "Rating")]
#[get("/profile/ratings/<user_id>?<query..>")]
pub async fn get_user_ratings(
    db: &State<DbConn>,
    _auth: AuthGuard,
    user_id: String,
    query: RatingsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let user_id = parse_id(&user_id, "user")?;
    let filter = doc! { "to_id": user_id };

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Rating>("ratings")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut ratings: Vec<RatingResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let rating: Rating = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        ratings.push(rating.into());
    }

    let total = db.collection::<Rating>("ratings")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "ratings": ratings,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}
