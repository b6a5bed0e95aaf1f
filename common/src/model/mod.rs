pub mod auth;
pub mod options;
