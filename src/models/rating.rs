use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

/// Role of the rater: a HIRER rating is the one the hirer leaves about the
/// worker, and vice versa. One of each per job, at most.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingType {
    Hirer,
    Worker,
}

impl RatingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingType::Hirer => "HIRER",
            RatingType::Worker => "WORKER",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Rating {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub value: i32, // 1-5
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub rating_type: RatingType,
    pub from_id: ObjectId,
    pub to_id: ObjectId,
    pub job_id: ObjectId,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateRatingDto {
    pub job_id: String,
    #[validate(range(min = 1, max = 5))]
    pub value: i32,
    #[validate(length(max = 2000))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RatingResponse {
    pub id: String,
    pub value: i32,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub rating_type: String,
    pub from_id: String,
    pub to_id: String,
    pub job_id: String,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        RatingResponse {
            id: rating.id.map(|id| id.to_hex()).unwrap_or_default(),
            value: rating.value,
            text: rating.text,
            rating_type: rating.rating_type.as_str().to_string(),
            from_id: rating.from_id.to_hex(),
            to_id: rating.to_id.to_hex(),
            job_id: rating.job_id.to_hex(),
        }
    }
}
