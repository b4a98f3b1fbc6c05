use serde::Serialize;
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,                      // serial user ID
    pub email: String,                // unique, stored lowercase
    #[serde(skip_serializing)]
    pub password_hash: String,        // bcrypt hash, not exposed in JSON
    pub username: Option<String>,     // display name, may be unset
}
