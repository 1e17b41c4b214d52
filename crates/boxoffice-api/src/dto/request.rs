//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use boxoffice_core::types::UserId;
use boxoffice_entity::account::CreateUser;
use boxoffice_entity::event::CreateEvent;

/// Book seats for an event.
///
/// Quantity bounds are checked by the booking service (`INVALID_QUANTITY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// Purchasing user.
    pub user_id: Uuid,
    /// Event to book.
    pub event_id: Uuid,
    /// Seats requested.
    pub quantity: i32,
}

/// Create an event (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub venue: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    /// Price per seat in cents.
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 1))]
    pub total_capacity: i32,
}

impl From<CreateEventRequest> for CreateEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            name: req.name,
            venue: req.venue,
            description: req.description,
            event_date: req.event_date,
            price: req.price,
            total_capacity: req.total_capacity,
        }
    }
}

/// Register a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Loyalty tier.
    #[serde(default = "default_tier")]
    #[validate(length(min = 1, max = 32))]
    pub tier: String,
}

fn default_tier() -> String {
    "standard".to_string()
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            tier: req.tier.to_ascii_lowercase(),
        }
    }
}

/// Join an event's waitlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinWaitlistRequest {
    pub user_id: Uuid,
    /// Overrides the user's stored tier for priority.
    pub tier: Option<String>,
}

impl JoinWaitlistRequest {
    pub fn user(&self) -> UserId {
        UserId::from_uuid(self.user_id)
    }
}

/// Manually promote waiting users into freed seats.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromoteRequest {
    #[validate(range(min = 1, max = 1000))]
    pub freed_seats: u32,
}
