use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // unique, lowercased
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,      // Argon2 PHC string, never plaintext
    pub name: String,
    pub surname: String,
    pub created_at: OffsetDateTime,
}

/// Values for a fresh `users` row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub surname: String,
}
