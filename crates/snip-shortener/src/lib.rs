//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], the implementation of the
//! [`Shortener`](snip_core::Shortener) trait. Core types are re-exported
//! from `snip_core`.

pub mod service;

pub use service::{ServiceSettings, ShortenerService};
pub use snip_core::{
    Resolution, ShortCode, ShortenParams, Shortener, ShortenerError, UrlRecord, UrlStats,
    ValidityPeriod,
};
