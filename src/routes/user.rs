use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use validator::Validate;
use crate::db::DbConn;
use crate::models::{Job, JobStatus, Rating, UpdateProfileDto, User, UserResponse};
use crate::guards::AuthGuard;
use crate::routes::parse_id;
use crate::utils::{ApiResponse, ApiError};
use rocket::futures::TryStreamExt;

async fn rating_summary(db: &DbConn, user_id: &ObjectId) -> Result<(f64, usize), ApiError> {
    let ratings: Vec<Rating> = db.collection::<Rating>("ratings")
        .find(doc! { "to_id": user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| ApiError::internal_error(format!("Collection error: {}", e)))?;

    let total = ratings.len();
    let avg = if total > 0 {
        ratings.iter().map(|r| r.value).sum::<i32>() as f64 / total as f64
    } else {
        0.0
    };
    Ok((avg, total))
}

/// Spendable credit: remaining payment across completed jobs worked by this
/// user, summed over all hirers.
async fn spendable_credit(db: &DbConn, user_id: &ObjectId) -> Result<i64, ApiError> {
    let jobs: Vec<Job> = db.collection::<Job>("jobs")
        .find(
            doc! { "worker_id": user_id, "status": JobStatus::Completed.as_str() },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| ApiError::internal_error(format!("Collection error: {}", e)))?;

    Ok(jobs.iter().map(|j| j.payment).sum())
}

/// --------------------
/// Own profile
/// --------------------
#[openapi(tag = "Profile")]
#[get("/profile")]
pub async fn get_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let (rating, total_ratings) = rating_summary(db, &auth.user_id).await?;
    let credit = spendable_credit(db, &auth.user_id).await?;

    let user_response: UserResponse = user.into();
    let mut response_data = serde_json::to_value(&user_response)
        .map_err(|e| ApiError::internal_error(format!("Serialization error: {}", e)))?;

    response_data["rating"] = serde_json::json!(rating);
    response_data["total_ratings"] = serde_json::json!(total_ratings);
    response_data["credit"] = serde_json::json!(credit);

    Ok(Json(ApiResponse::success(response_data)))
}

/// --------------------
/// Update profile
/// --------------------
#[openapi(tag = "Profile")]
#[put("/profile", data = "<dto>")]
pub async fn update_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    dto.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid profile: {}", e)))?;

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref name) = dto.name {
        update_doc.insert("name", name);
    }
    if let Some(ref contact_info) = dto.contact_info {
        update_doc.insert("contact_info", contact_info);
    }

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": auth.user_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update profile: {}", e)))?;

    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// --------------------
/// Public profile
/// --------------------
#[openapi(tag = "Profile")]
#[get("/profile/<user_id>")]
pub async fn get_public_profile(
    db: &State<DbConn>,
    _auth: AuthGuard,
    user_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let (rating, total_ratings) = rating_summary(db, &user_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "id": user_id.to_hex(),
        "name": user.name,
        "contact_info": user.contact_info,
        "rating": rating,
        "total_ratings": total_ratings,
    }))))
}

/// --------------------
/// Notifications
/// --------------------
#[openapi(tag = "Profile")]
#[get("/profile/notifications")]
pub async fn get_notifications(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "notifications": user.notifications,
        "new_notifications": user.new_notifications,
    }))))
}

#[openapi(tag = "Profile")]
#[post("/profile/notifications/read")]
pub async fn mark_notifications_read(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    db.collection::<User>("users")
        .update_one(
            doc! { "_id": auth.user_id },
            doc! { "$set": { "new_notifications": false, "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update notifications: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Notifications marked as read"
    }))))
}
