//! # Tarra Request Core
//!
//! Resilient HTTP access to the dashboard API: bearer authentication via
//! the token broker, failure classification and bounded retries with
//! exponential backoff.
//!
//! The transport underneath ([`bridge_traits::http::HttpClient`]) is
//! single-shot; all retry decisions live in [`ApiClient`].

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiRequest, ApiResponse, RetryPolicy, TokenSource};
pub use error::{RequestFailure, Result};
