//! Domain types shared across the application.

pub mod user;

pub use user::UserProfile;
