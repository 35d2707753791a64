use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime};
use mongodb::options::UpdateOptions;
use validator::Validate;
use crate::db::DbConn;
use crate::models::{User, UserResponse};
use crate::guards::AuthGuard;
use crate::services::JwtService;
use crate::utils::{validate_email, ApiResponse, ApiError};

/// Identity is delegated: the provider mints bearer tokens, this server only
/// verifies them and keeps a profile document per subject.
#[derive(serde::Deserialize, Validate, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct SyncProfileDto {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub contact_info: Option<String>,
}

/// --------------------
/// Profile sync
/// --------------------
/// Upserts the caller's user document from their verified token claims.
/// Clients call this once after login so first-time users exist before they
/// touch jobs or offerings.
#[openapi(tag = "Auth")]
#[post("/auth/sync", data = "<dto>")]
pub async fn sync_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<SyncProfileDto>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    dto.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid profile: {}", e)))?;

    let now = DateTime::now();
    let mut set_doc = doc! { "updated_at": now };
    if let Some(ref name) = dto.name {
        set_doc.insert("name", name);
    }
    if let Some(ref contact_info) = dto.contact_info {
        set_doc.insert("contact_info", contact_info);
    }

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": auth.user_id },
            doc! {
                "$set": set_doc,
                "$setOnInsert": {
                    "email": &auth.email,
                    "notifications": [],
                    "new_notifications": false,
                    "created_at": now,
                }
            },
            UpdateOptions::builder().upsert(true).build(),
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to sync profile: {}", e)))?;

    let user = db.collection::<User>("users")
        .find_one(doc! { "_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::internal_error("Profile sync did not persist"))?;

    Ok(Json(ApiResponse::success(user.into())))
}

#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct DevTokenDto {
    pub email: String,
    pub name: Option<String>,
}

/// --------------------
/// Development token
/// --------------------
/// Stand-in for the identity provider during local development. Hidden
/// outside the development profile.
#[openapi(tag = "Auth")]
#[post("/auth/dev-token", data = "<dto>")]
pub async fn dev_token(
    db: &State<DbConn>,
    dto: Json<DevTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !crate::config::Config::is_development() {
        return Err(ApiError::not_found("Resource not found"));
    }

    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let users = db.collection::<User>("users");
    let existing = users
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let user_id = match existing {
        Some(user) => user
            .id
            .ok_or_else(|| ApiError::internal_error("User document without id"))?,
        None => {
            let now = DateTime::now();
            let user = User {
                id: None,
                email: dto.email.clone(),
                name: dto.name.clone(),
                contact_info: None,
                notifications: Vec::new(),
                new_notifications: false,
                created_at: now,
                updated_at: now,
            };
            let result = users
                .insert_one(&user, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to create user: {}", e)))?;
            result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| ApiError::internal_error("Invalid user ID"))?
        }
    };

    let token = JwtService::generate_token(&user_id, &dto.email)
        .map_err(|e| ApiError::internal_error(format!("Failed to mint token: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "token": token,
        "user_id": user_id.to_hex()
    }))))
}
