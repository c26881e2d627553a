use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub dietary_preferences: Vec<String>,
    pub allergies: Vec<String>,
    pub pantry_items: Vec<String>,
    pub calorie_target: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Insert rejected by the unique index on `users.email`.
#[derive(Debug, thiserror::Error)]
#[error("email already registered")]
pub struct EmailTaken;

/// Validated input for account creation. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub dietary_preferences: Vec<String>,
    pub allergies: Vec<String>,
    pub pantry_items: Vec<String>,
    pub calorie_target: i32,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub pantry_items: Option<Vec<String>>,
    pub calorie_target: Option<i32>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    #[cfg(test)]
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(v) = &self.dietary_preferences {
            user.dietary_preferences = v.clone();
        }
        if let Some(v) = &self.allergies {
            user.allergies = v.clone();
        }
        if let Some(v) = &self.pantry_items {
            user.pantry_items = v.clone();
        }
        if let Some(c) = self.calorie_target {
            user.calorie_target = c;
        }
    }
}
