pub mod application;
pub mod auth;
pub mod health;
pub mod job;
pub mod user;
