//! Common library for the timekeeping services
//!
//! This crate provides shared functionality used by the auth and api
//! services: PostgreSQL connectivity and migrations, the storage error type
//! and access token verification.

pub mod database;
pub mod error;
pub mod token;
