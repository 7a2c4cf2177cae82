pub mod access;
pub mod admin;
pub mod auth;
pub mod exam;
pub mod import;
pub mod profile;
