//! Common library for the recipe service
//!
//! This crate provides the infrastructure shared by the service: database
//! connectivity, image storage backends and their error types.

pub mod database;
pub mod error;
pub mod storage;
