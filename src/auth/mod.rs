//! # Authentication Module
//!
//! Handles JWT token issuance, validation, password hashing and the middleware
//! that guards identity-scoped routes.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
