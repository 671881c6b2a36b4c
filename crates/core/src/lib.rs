//! BULTEX Core - shared types for the public site, the admin and the CLI.
//!
//! Used by:
//! - `storefront` - Public website (home, catalog, contact)
//! - `admin` - Session-gated dashboard for products, catalogs and settings
//! - `cli` - Migrations, seed data and admin users
//!
//! # Architecture
//!
//! Everything in [`types`] is plain data plus pure functions. The one stateful
//! piece is [`site_context`], the published snapshot of site settings that
//! both servers keep in memory. Database access lives behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Entities, IDs, prices, emails, upload checks and site settings
//! - [`site_context`] - Load, publish and refresh the site-settings snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod site_context;
pub mod types;

pub use site_context::{SiteContext, SiteContextError, SiteSnapshot, SiteSource};
#[cfg(feature = "postgres")]
pub use site_context::{PgSiteSource, SITE_CHANGED_CHANNEL, listen_for_changes, notify_site_changed};
pub use types::*;
