//! Wiki API client — shared between the sync driver and the CLI.
//!
//! This crate is the single source of truth for the wiki wire contract:
//! token acquisition, document creation, node listing.
//!
//! Blocking, single-threaded. No retries beyond bounded backoff on
//! retryable server errors. No on-disk state beyond saved credentials.

mod auth;
mod client;

pub use auth::{AppCredentials, auth_file_path, load_auth, save_auth, delete_auth};
pub use client::{
    WikiClient, WikiError, ClientOptions, WikiNode,
    DEFAULT_API_BASE,
};
