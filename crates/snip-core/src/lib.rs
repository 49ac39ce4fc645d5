//! Core types and traits for the Snip URL shortener.
//!
//! This crate provides the record model, the error taxonomy, the input
//! validation rules and the trait seams (storage, clock, shortener) shared
//! by the storage backends, the shortening service and the CLI.

pub mod clock;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;
pub mod stats;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ShortenerError, StorageError, ValidationError};
pub use repository::{ClickRecord, RecordId, RecordStore, UrlRecord};
pub use shortcode::ShortCode;
pub use shortener::{Resolution, ShortenParams, Shortener};
pub use stats::{UrlStats, UrlStatus, UrlSummary};
pub use validation::{validate_url, ValidityPeriod};
