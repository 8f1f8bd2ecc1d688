pub mod chat;
pub mod debug;
pub mod health;
pub mod sessions;
pub mod validation;

pub const API_PREFIX: &str = "/api/v1";
