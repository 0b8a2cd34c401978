//! Common utilities and types shared across drivekit crates.
//!
//! Holds the error taxonomy and the OAuth2 credential type so that the
//! client library and the command-line front end agree on both.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Credential, FOLDER_MIME_TYPE};
