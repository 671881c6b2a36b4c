//! BULTEX admin dashboard library.
//!
//! Session-gated pages for managing products, categories, PDF catalogs,
//! site imagery, admin accounts and site settings. Files go to Supabase
//! Storage and accounts live in Supabase Auth; everything else is in the
//! shared Postgres database.
//!
//! # Security
//!
//! This crate holds the Supabase service-role key, which bypasses every
//! storage and identity policy. Keep it out of logs and off the public
//! site.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
