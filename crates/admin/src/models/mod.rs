//! Domain models for admin.
//!
//! Catalog entities come from `bultex_core`; the types here only exist on
//! the admin side: identity-service users and the session payload.

pub mod admin_user;
pub mod session;

pub use admin_user::AdminUser;
pub use session::{CurrentAdmin, keys as session_keys};
