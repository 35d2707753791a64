use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::ClientSession;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use validator::Validate;
use crate::db::DbConn;
use crate::models::{
    AcceptJobDto, ApplyJobDto, CompleteJobDto, CreateJobDto, Job, JobResponse, JobStatus,
};
use crate::guards::AuthGuard;
use crate::routes::{commit, load_job_in_session, parse_id, start_transaction};
use crate::services::NotificationService;
use crate::utils::{ApiResponse, ApiError};

/// --------------------
/// Create job
/// --------------------
#[openapi(tag = "Job")]
#[post("/job/create", data = "<dto>")]
pub async fn create_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateJobDto>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    dto.validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid job: {}", e)))?;

    let now = DateTime::now();
    let mut job = Job {
        id: None,
        title: dto.title.clone(),
        description: dto.description.clone(),
        location: dto.location.clone(),
        payment: dto.payment,
        status: JobStatus::Searching,
        hirer_id: auth.user_id,
        worker_id: None,
        applications: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let result = db.collection::<Job>("jobs")
        .insert_one(&job, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create job: {}", e)))?;

    job.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Job posted".to_string(),
        job.into(),
    )))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct JobsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub location: Option<String>,
}

/// --------------------
/// Browse jobs
/// --------------------
#[openapi(tag = "Job")]
#[get("/jobs?<query..>")]
pub async fn list_jobs(
    db: &State<DbConn>,
    _auth: AuthGuard,
    query: JobsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(ref status) = query.status {
        match status.as_str() {
            "SEARCHING" | "IN_PROGRESS" | "COMPLETED" => {
                filter.insert("status", status);
            }
            _ => return Err(ApiError::bad_request("Invalid status filter")),
        }
    }
    if let Some(ref location) = query.location {
        filter.insert("location", doc! { "$regex": location, "$options": "i" });
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db.collection::<Job>("jobs")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut jobs: Vec<JobResponse> = Vec::new();
    while cursor.advance().await.map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))? {
        let job: Job = cursor.deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        jobs.push(job.into());
    }

    let total = db.collection::<Job>("jobs")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "jobs": jobs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

/// --------------------
/// Get one job
/// --------------------
#[openapi(tag = "Job")]
#[get("/job/<job_id>")]
pub async fn get_job(
    db: &State<DbConn>,
    _auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job_id = parse_id(&job_id, "job")?;

    let job = db.collection::<Job>("jobs")
        .find_one(doc! { "_id": job_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::success(job.into())))
}

/// --------------------
/// Apply
/// --------------------
#[openapi(tag = "Job")]
#[post("/job/apply", data = "<dto>")]
pub async fn apply_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<ApplyJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let job_id = parse_id(&dto.job_id, "job")?;

    let job = db.collection::<Job>("jobs")
        .find_one(doc! { "_id": job_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    job.ensure_can_apply(&auth.user_id)?;

    db.collection::<Job>("jobs")
        .update_one(
            doc! { "_id": job_id },
            doc! {
                "$addToSet": { "applications": auth.user_id },
                "$set": { "updated_at": DateTime::now() }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to apply: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Application submitted".to_string(),
        serde_json::json!({ "job_id": job_id.to_hex() }),
    )))
}

/// --------------------
/// Accept a worker
/// --------------------
#[openapi(tag = "Job")]
#[post("/job/accept", data = "<dto>")]
pub async fn accept_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<AcceptJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let job_id = parse_id(&dto.job_id, "job")?;
    let worker_id = parse_id(&dto.worker_id, "worker")?;

    let mut session = start_transaction(db).await?;
    let outcome = accept_in_txn(db, &mut session, &auth, job_id, worker_id).await;

    match outcome {
        Ok(()) => {
            commit(session).await?;
            Ok(Json(ApiResponse::success_with_message(
                "Worker accepted".to_string(),
                serde_json::json!({
                    "job_id": job_id.to_hex(),
                    "worker_id": worker_id.to_hex()
                }),
            )))
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            Err(e)
        }
    }
}

async fn accept_in_txn(
    db: &DbConn,
    session: &mut ClientSession,
    auth: &AuthGuard,
    job_id: ObjectId,
    worker_id: ObjectId,
) -> Result<(), ApiError> {
    let job = load_job_in_session(db, session, job_id).await?;
    job.ensure_can_accept(&auth.user_id, &worker_id)?;

    db.collection::<Job>("jobs")
        .update_one_with_session(
            doc! { "_id": job_id },
            doc! {
                "$set": {
                    "status": JobStatus::InProgress.as_str(),
                    "worker_id": worker_id,
                    "applications": [],
                    "updated_at": DateTime::now()
                }
            },
            None,
            session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to accept worker: {}", e)))?;

    NotificationService::push_with_session(
        db,
        session,
        &worker_id,
        &NotificationService::accepted_text(&job.title),
    )
    .await
    .map_err(|e| ApiError::internal_error(format!("Failed to notify worker: {}", e)))?;

    Ok(())
}

/// --------------------
/// Complete
/// --------------------
#[openapi(tag = "Job")]
#[post("/job/complete", data = "<dto>")]
pub async fn complete_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CompleteJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let job_id = parse_id(&dto.job_id, "job")?;

    let mut session = start_transaction(db).await?;
    let outcome = complete_in_txn(db, &mut session, &auth, job_id).await;

    match outcome {
        Ok(()) => {
            commit(session).await?;
            Ok(Json(ApiResponse::success_with_message(
                "Job completed".to_string(),
                serde_json::json!({ "job_id": job_id.to_hex() }),
            )))
        }
        Err(e) => {
            let _ = session.abort_transaction().await;
            Err(e)
        }
    }
}

async fn complete_in_txn(
    db: &DbConn,
    session: &mut ClientSession,
    auth: &AuthGuard,
    job_id: ObjectId,
) -> Result<(), ApiError> {
    let job = load_job_in_session(db, session, job_id).await?;
    job.ensure_can_complete(&auth.user_id)?;

    db.collection::<Job>("jobs")
        .update_one_with_session(
            doc! { "_id": job_id },
            doc! {
                "$set": {
                    "status": JobStatus::Completed.as_str(),
                    "updated_at": DateTime::now()
                }
            },
            None,
            session,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to complete job: {}", e)))?;

    // ensure_can_complete guarantees a worker exists by now
    if let Some(worker_id) = job.worker_id {
        NotificationService::push_with_session(
            db,
            session,
            &worker_id,
            &NotificationService::completed_text(&job.title, job.payment),
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to notify worker: {}", e)))?;
    }

    Ok(())
}
