use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::models::RatingType;
use crate::utils::ApiError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Searching,
    InProgress,
    Completed,
}

impl JobStatus {
    /// The wire/storage spelling, for use in bson filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Searching => "SEARCHING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Remaining spendable credit once the job completes. Never negative.
    pub payment: i64,
    pub status: JobStatus,
    pub hirer_id: ObjectId,
    pub worker_id: Option<ObjectId>,
    pub applications: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Job {
    /// SEARCHING only; the hirer can't apply to their own job; no duplicates.
    pub fn ensure_can_apply(&self, applicant: &ObjectId) -> Result<(), ApiError> {
        if self.hirer_id == *applicant {
            return Err(ApiError::bad_request("You cannot apply to your own job"));
        }
        if !matches!(self.status, JobStatus::Searching) {
            return Err(ApiError::bad_request("This job is no longer accepting applications"));
        }
        if self.applications.contains(applicant) {
            return Err(ApiError::conflict("You have already applied to this job"));
        }
        Ok(())
    }

    /// Hirer only, SEARCHING only, and the worker must come from the
    /// applicant list.
    pub fn ensure_can_accept(&self, caller: &ObjectId, worker: &ObjectId) -> Result<(), ApiError> {
        if self.hirer_id != *caller {
            return Err(ApiError::forbidden("Only the hirer can accept an applicant"));
        }
        if !matches!(self.status, JobStatus::Searching) {
            return Err(ApiError::bad_request("A worker has already been accepted for this job"));
        }
        if !self.applications.contains(worker) {
            return Err(ApiError::bad_request("That user has not applied to this job"));
        }
        Ok(())
    }

    /// Hirer only, IN_PROGRESS only. Already-completed jobs get their own
    /// message so clients can tell the two rejections apart.
    pub fn ensure_can_complete(&self, caller: &ObjectId) -> Result<(), ApiError> {
        if self.hirer_id != *caller {
            return Err(ApiError::forbidden("Only the hirer can complete a job"));
        }
        match self.status {
            JobStatus::Completed => Err(ApiError::bad_request("This job is already completed")),
            JobStatus::Searching => Err(ApiError::bad_request("This job is not in progress yet")),
            JobStatus::InProgress => {
                if self.worker_id.is_none() {
                    return Err(ApiError::bad_request("This job has no accepted worker"));
                }
                Ok(())
            }
        }
    }

    /// COMPLETED only. The rater's role in the job decides the rating type
    /// and who gets rated.
    pub fn ensure_can_rate(&self, rater: &ObjectId) -> Result<(RatingType, ObjectId), ApiError> {
        if !matches!(self.status, JobStatus::Completed) {
            return Err(ApiError::bad_request("Ratings open once the job is completed"));
        }
        if self.hirer_id == *rater {
            let worker = self
                .worker_id
                .ok_or_else(|| ApiError::bad_request("This job has no accepted worker"))?;
            return Ok((RatingType::Hirer, worker));
        }
        if self.worker_id.as_ref() == Some(rater) {
            return Ok((RatingType::Worker, self.hirer_id));
        }
        Err(ApiError::forbidden("Only the hirer or the worker can rate this job"))
    }

    /// Whether this job's remaining payment can cover a purchase.
    pub fn can_fund(&self, total: i64) -> bool {
        matches!(self.status, JobStatus::Completed) && self.payment >= total
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(range(min = 0))]
    pub payment: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyJobDto {
    pub job_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AcceptJobDto {
    pub job_id: String,
    pub worker_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteJobDto {
    pub job_id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub payment: i64,
    pub status: String,
    pub hirer_id: String,
    pub worker_id: Option<String>,
    pub applications: Vec<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: job.title,
            description: job.description,
            location: job.location,
            payment: job.payment,
            status: job.status.as_str().to_string(),
            hirer_id: job.hirer_id.to_hex(),
            worker_id: job.worker_id.map(|id| id.to_hex()),
            applications: job.applications.iter().map(|id| id.to_hex()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;

    fn job(status: JobStatus) -> (Job, ObjectId, ObjectId) {
        let hirer = ObjectId::new();
        let worker = ObjectId::new();
        let job = Job {
            id: Some(ObjectId::new()),
            title: "Fence repair".to_string(),
            description: "Fix the back fence".to_string(),
            location: "Riverside".to_string(),
            payment: 100,
            status,
            hirer_id: hirer,
            worker_id: None,
            applications: Vec::new(),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        (job, hirer, worker)
    }

    #[test]
    fn apply_rejects_duplicates_with_conflict() {
        let (mut job, _, worker) = job(JobStatus::Searching);
        assert!(job.ensure_can_apply(&worker).is_ok());
        job.applications.push(worker);
        let err = job.ensure_can_apply(&worker).unwrap_err();
        assert_eq!(err.status, Status::Conflict);
    }

    #[test]
    fn apply_rejects_hirer_and_non_searching_jobs() {
        let (job, hirer, worker) = job(JobStatus::Searching);
        assert_eq!(job.ensure_can_apply(&hirer).unwrap_err().status, Status::BadRequest);

        let (job, _, _) = self::job(JobStatus::InProgress);
        assert_eq!(job.ensure_can_apply(&worker).unwrap_err().status, Status::BadRequest);
    }

    #[test]
    fn accept_requires_hirer_and_listed_applicant() {
        let (mut job, hirer, worker) = job(JobStatus::Searching);
        let stranger = ObjectId::new();

        let err = job.ensure_can_accept(&stranger, &worker).unwrap_err();
        assert_eq!(err.status, Status::Forbidden);

        let err = job.ensure_can_accept(&hirer, &worker).unwrap_err();
        assert_eq!(err.status, Status::BadRequest);

        job.applications.push(worker);
        assert!(job.ensure_can_accept(&hirer, &worker).is_ok());
    }

    #[test]
    fn accept_rejects_in_progress_job() {
        let (mut job, hirer, worker) = job(JobStatus::InProgress);
        job.applications.push(worker);
        let err = job.ensure_can_accept(&hirer, &worker).unwrap_err();
        assert_eq!(err.status, Status::BadRequest);
    }

    #[test]
    fn complete_distinguishes_already_completed() {
        let (mut job, hirer, worker) = job(JobStatus::InProgress);
        job.worker_id = Some(worker);
        assert!(job.ensure_can_complete(&hirer).is_ok());

        job.status = JobStatus::Completed;
        let err = job.ensure_can_complete(&hirer).unwrap_err();
        assert_eq!(err.status, Status::BadRequest);
        assert!(err.message.contains("already completed"));

        job.status = JobStatus::Searching;
        let err = job.ensure_can_complete(&hirer).unwrap_err();
        assert!(!err.message.contains("already completed"));
    }

    #[test]
    fn rate_only_after_completion_and_only_by_participants() {
        let (mut job, hirer, worker) = job(JobStatus::InProgress);
        job.worker_id = Some(worker);

        assert_eq!(job.ensure_can_rate(&hirer).unwrap_err().status, Status::BadRequest);

        job.status = JobStatus::Completed;
        let (rating_type, ratee) = job.ensure_can_rate(&hirer).unwrap();
        assert!(matches!(rating_type, RatingType::Hirer));
        assert_eq!(ratee, worker);

        let (rating_type, ratee) = job.ensure_can_rate(&worker).unwrap();
        assert!(matches!(rating_type, RatingType::Worker));
        assert_eq!(ratee, hirer);

        let stranger = ObjectId::new();
        assert_eq!(job.ensure_can_rate(&stranger).unwrap_err().status, Status::Forbidden);
    }

    #[test]
    fn can_fund_requires_completion_and_balance() {
        let (mut job, _, _) = job(JobStatus::Completed);
        assert!(job.can_fund(100));
        assert!(!job.can_fund(101));

        job.status = JobStatus::InProgress;
        assert!(!job.can_fund(1));
    }

    #[test]
    fn full_lifecycle_earns_spendable_credit() {
        let (mut job, hirer, worker) = job(JobStatus::Searching);

        job.ensure_can_apply(&worker).unwrap();
        job.applications.push(worker);

        job.ensure_can_accept(&hirer, &worker).unwrap();
        job.applications.clear();
        job.worker_id = Some(worker);
        job.status = JobStatus::InProgress;

        job.ensure_can_complete(&hirer).unwrap();
        job.status = JobStatus::Completed;

        // payment=100 now funds purchases up to 100 credit
        assert!(job.can_fund(100));
        assert!(!job.can_fund(101));

        let (rating_type, ratee) = job.ensure_can_rate(&worker).unwrap();
        assert!(matches!(rating_type, RatingType::Worker));
        assert_eq!(ratee, hirer);
    }

    #[test]
    fn status_serializes_to_wire_spelling() {
        assert_eq!(serde_json::to_value(JobStatus::InProgress).unwrap(), "IN_PROGRESS");
        assert_eq!(JobStatus::Searching.as_str(), "SEARCHING");
    }
}
