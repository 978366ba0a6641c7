//! Bridges an OpenID Connect login to a Filestash session backed by
//! temporary S3 credentials.
//!
//! The `/callback` route drives one pass through the pipeline:
//! authorization code to access token ([`token`]), access token to
//! temporary storage credentials ([`federation`]), credentials to a Filestash
//! session cookie ([`session`]). Provider endpoints come from the discovery
//! document, cached in [`discovery`].

pub mod bridge;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod federation;
pub mod logging;
pub mod server;
pub mod session;
pub mod token;
pub mod web;

#[cfg(test)]
mod tests;
