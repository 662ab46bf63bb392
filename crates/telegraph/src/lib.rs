//! Telegraph publishing API client
//!
//! Defines the `TelegraphApi` trait that the account pool talks to, the
//! request/response types it exchanges, and a reqwest-backed implementation
//! (`HttpClient`) for the real `api.telegra.ph` endpoint.
//!
//! The only part of the wire protocol the pool cares about is its failure
//! contract: flood control is reported as `Error::FloodWait(seconds)`, every
//! other failure is opaque.

pub mod api;
pub mod client;
pub mod error;
pub mod nodes;
pub mod token;
pub mod types;

pub use api::TelegraphApi;
pub use client::{ClientOptions, HttpClient};
pub use error::{Error, Result, parse_flood_wait};
pub use token::{AccessToken, TOKEN_LEN};
pub use types::{AccountInfo, AccountProfile, Page, PageArgs};
