//! BULTEX public website.
//!
//! Server-rendered pages for the catalog, PDF catalogs and company
//! information, plus the contact form API. Site text and imagery come from
//! the shared [`bultex_core::SiteContext`], refreshed whenever the admin
//! dashboard publishes a change.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
