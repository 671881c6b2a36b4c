//! Domain types for the BULTEX website.
//!
//! Entities mirror the database tables; the free functions hold the small
//! amount of pure logic shared by the public site and the admin.

pub mod catalog;
pub mod contact;
pub mod email;
pub mod files;
pub mod id;
pub mod price;
pub mod site;

pub use catalog::{Catalog, Category, CategoryRef, Product, resolve_category, slugify};
pub use contact::{ContactError, ContactMessage, ContactSubmission, ValidContact};
pub use email::{Email, EmailError};
pub use files::{
    IMAGE_CONTENT_TYPES, MAX_IMAGE_BYTES, MAX_PDF_BYTES, UploadError, extension_for,
    format_file_size, validate_image, validate_pdf,
};
pub use id::*;
pub use price::{Price, PriceError};
pub use site::{
    ConfigField, ConfigTab, DEFAULT_IMAGE_ALT, FORM_RECIPIENT_KEY, SiteConfig, SiteImage,
    SiteSection,
};
