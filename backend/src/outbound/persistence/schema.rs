//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. `diesel
//! print-schema` regenerates them from a live database.

diesel::table! {
    /// Application users, newest first via `idx_users_created_at`.
    users (id) {
        /// Store-assigned `BIGSERIAL` key.
        id -> Int8,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
