use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::ClientSession;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use validator::Validate;
use crate::db::DbConn;
use crate::models::{CreateOfferingDto, Job, JobStatus, Offering, OfferingResponse, SpendDto};
use crate::guards::AuthGuard;
use crate::routes::{commit, parse_id, start_transaction};
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct OfferingsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub owner_id: Option<String>,
}

/// --------------------
/// Browse offerings
/// --------------------
#[openapi(tag = "Offering")]
#[get("/offerings?<query..>")]
pub async fn list_offerings(
    db: &State<DbConn>,
    _auth: AuthGuard,
    query: OfferingsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(ref owner_id) = query.owner_id {
        filter.insert("owner_id", parse_id(owner_id, "user")?);
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Offering>("offerings")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut offerings: Vec<OfferingResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let offering: Offering = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        offerings.push(offering.into());
    }

    let total = db.collection::<Offering>("offerings")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "offerings": offerings,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

/// --------------------
/// Own offerings
/// --------------------
#[openapi(tag = "Offering")]
#[get("/profile/offerings")]
pub async fn my_offerings(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut cursor = db.collection::<Offering>("offerings")
        .find(doc! { "owner_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut offerings: Vec<OfferingResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let offering: Offering = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        offerings.push(offering.into());
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "offerings": offerings,
        "total": offerings.len()
    }))))
}

/// --------------------
/// Create offering
/// --------------------
#[openapi(tag = "Offering")]
#[post("/profile/offering", data = "<dto>")]
pub async fn create_offering(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateOfferingDto>,
) -> Result<Json<ApiResponse<OfferingResponse>>, ApiError> {
    dto.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid offering: {}", e)))?;

    let now = DateTime::now();
    let mut offering = Offering {
        id: None,
        owner_id: auth.user_id,
        description: dto.description.clone(),
        cost: dto.cost,
        quantity: dto.quantity,
        created_at: now,
        updated_at: now,
    };

    let result = db.collection::<Offering>("offerings")
        .insert_one(&offering, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create offering: {}", e)))?;

    offering.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Offering listed".to_string(),
        offering.into(),
    )))
}

/// --------------------
/// Delete offering
/// --------------------
#[openapi(tag = "Offering")]
#[delete("/profile/offering/<offering_id>")]
pub async fn delete_offering(
    db: &State<DbConn>,
    auth: AuthGuard,
    offering_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let offering_id = parse_id(&offering_id, "offering")?;

    let offering = db.collection::<Offering>("offerings")
        .find_one(doc! { "_id": offering_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Offering not found"))?;

    if offering.owner_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to delete this offering"));
    }

    db.collection::<Offering>("offerings")
        .delete_one(doc! { "_id": offering_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete offering: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Offering deleted successfully"
    }))))
}

/// --------------------
/// Spend credit
/// --------------------
/// Settles a purchase against the buyer's completed-job credit with the
/// offering's owner: picks the first completed job with enough remaining
/// payment, decrements it and the offering stock, and notifies the seller.
#[openapi(tag = "Offering")]
#[post("/profile/spend", data = "<dto>")]
pub async fn spend_credit(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<SpendDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    dto.validate()
        .map_err(|_| ApiError::bad_request("Quantity must be at least 1"))?;

    let offering_id = parse_id(&dto.offering_id, "offering")?;
    let quantity = dto.quantity.unwrap_or(1);

    let mut session = start_transaction(db).await?;
    let outcome = spend_in_txn(db, &mut session, &auth, offering_id, quantity).await;

    match outcome {
        Ok(receipt) => {
            commit(session).await?;
            Ok(Json(ApiResponse::success_with_message(
                "Purchase complete".to_string(),
                receipt,
            )))
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            Err(e)
        }
    }
}

async fn spend_in_txn(
    db: &DbConn,
    session: &mut ClientSession,
    auth: &AuthGuard,
    offering_id: ObjectId,
    quantity: i64,
) -> Result<serde_json::Value, ApiError> {
    let offering = db.collection::<Offering>("offerings")
        .find_one_with_session(doc! { "_id": offering_id }, None, session)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Offering not found"))?;

    if offering.owner_id == auth.user_id {
        return Err(ApiError::bad_request("You cannot spend credit on your own offering"));
    }

    if !offering.has_stock(quantity) {
        return Err(ApiError::conflict("Offering stock is insufficient"));
    }

    let total = offering
        .cost
        .checked_mul(quantity)
        .ok_or_else(|| ApiError::bad_request("Quantity too large"))?;

    // Completed jobs where the seller hired the buyer, in query return order.
    let filter = doc! {
        "hirer_id": offering.owner_id,
        "worker_id": auth.user_id,
        "status": JobStatus::Completed.as_str(),
    };
    let mut cursor = db.collection::<Job>("jobs")
        .find_with_session(filter, None, session)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut seen_any = false;
    let mut funding_job: Option<Job> = None;
    while let Some(job) = cursor.next(session).await {
        let job = job.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?;
        seen_any = true;
        if job.can_fund(total) {
            funding_job = Some(job);
            break;
        }
    }

    if !seen_any {
        return Err(ApiError::bad_request("You have no completed jobs with this seller"));
    }
    let job = funding_job
        .ok_or_else(|| ApiError::bad_request("Not enough remaining credit with this seller"))?;
    let job_id = job
        .id
        .ok_or_else(|| ApiError::internal_error("Job document without id"))?;

    // Guarded decrements keep payment and quantity from ever going negative,
    // even against a concurrent spend.
    let charged = db.collection::<Job>("jobs")
        .update_one_with_session(
            doc! { "_id": job_id, "payment": { "$gte": total } },
            doc! {
                "$inc": { "payment": -total },
                "$set": { "updated_at": DateTime::now() }
            },
            None,
            session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to charge credit: {}", e)))?;

    if charged.modified_count == 0 {
        return Err(ApiError::bad_request("Not enough remaining credit with this seller"));
    }

    if offering.quantity.is_some() {
        let decremented = db.collection::<Offering>("offerings")
            .update_one_with_session(
                doc! { "_id": offering_id, "quantity": { "$gte": quantity } },
                doc! {
                    "$inc": { "quantity": -quantity },
                    "$set": { "updated_at": DateTime::now() }
                },
                None,
                session,
            )
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to update stock: {}", e)))?;

        if decremented.modified_count == 0 {
            return Err(ApiError::conflict("Offering stock is insufficient"));
        }
    }

    NotificationService::push_with_session(
        db,
        session,
        &offering.owner_id,
        &NotificationService::purchase_text(&offering.description, quantity, total),
    )
    .await
    .map_err(|e| ApiError::internal_error(format!("Failed to notify seller: {}", e)))?;

    Ok(serde_json::json!({
        "offering_id": offering_id.to_hex(),
        "job_id": job_id.to_hex(),
        "quantity": quantity,
        "total": total,
        "remaining_payment": job.payment - total,
    }))
}
