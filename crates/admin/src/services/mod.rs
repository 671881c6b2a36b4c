//! Clients for the external services the admin depends on.
//!
//! # Services
//!
//! - `identity` - Supabase Auth: password login and admin-account management
//! - `storage` - Supabase Storage: PDF and image uploads

pub mod identity;
pub mod storage;

pub use identity::{IdentityError, IdentityProvider, SupabaseAuthClient};
pub use storage::{ObjectStore, StorageError, SupabaseStorage, Upload, buckets};
