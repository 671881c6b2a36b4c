//! External services used by the storefront.

pub mod email;

pub use email::{EmailError, EmailService};
