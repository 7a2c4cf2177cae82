//! Client library for the school exam bank.
//!
//! The hosted backend owns authentication, persistence, exam generation and
//! the semantic checks on imported content. This crate owns what happens on
//! the client side of those calls: turning a teacher's spreadsheet into the
//! import contract, driving the validate/import sequence, and deciding which
//! role may reach which area.

pub mod access;
pub mod api;
pub mod config;
pub mod exam;
pub mod import;
