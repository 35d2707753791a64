use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Offering {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub description: String,
    /// Credit cost per unit.
    pub cost: i64,
    /// None = unlimited stock.
    pub quantity: Option<i64>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Offering {
    pub fn has_stock(&self, requested: i64) -> bool {
        match self.quantity {
            Some(available) => available >= requested,
            None => true,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateOfferingDto {
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub cost: i64,
    #[validate(range(min = 0))]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SpendDto {
    pub offering_id: String,
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OfferingResponse {
    pub id: String,
    pub owner_id: String,
    pub description: String,
    pub cost: i64,
    pub quantity: Option<i64>,
}

impl From<Offering> for OfferingResponse {
    fn from(offering: Offering) -> Self {
        OfferingResponse {
            id: offering.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner_id: offering.owner_id.to_hex(),
            description: offering.description,
            cost: offering.cost,
            quantity: offering.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_quantity_never_runs_out() {
        let offering = Offering {
            id: None,
            owner_id: ObjectId::new(),
            description: "Guitar lesson".to_string(),
            cost: 30,
            quantity: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        assert!(offering.has_stock(1_000_000));
    }

    #[test]
    fn tracked_quantity_enforces_stock() {
        let offering = Offering {
            id: None,
            owner_id: ObjectId::new(),
            description: "Sourdough loaf".to_string(),
            cost: 5,
            quantity: Some(2),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        assert!(offering.has_stock(2));
        assert!(!offering.has_stock(3));
    }
}
