//! Google Drive v3 client for drivekit.
//!
//! This crate provides:
//! - OAuth2 authorization-code flow with the `drive` scope
//! - A configurable table of endpoint templates
//! - Typed query and body builders that omit absent parameters
//! - Search-expression composition for `files.list`
//! - A client issuing one request per operation
//!
//! # Example
//! ```no_run
//! # async fn run() -> drivekit_common::Result<()> {
//! use drivekit_client::{DriveClient, DriveConfig};
//! use drivekit_common::Credential;
//!
//! let client = DriveClient::new(DriveConfig::default())?
//!     .with_credential(Credential::bearer("ya29.token"));
//! let page = client.list_files_in_folder("root", None).await?;
//! for file in page.files {
//!     println!("{} {}", file.id, file.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod params;
pub mod query;
pub mod token;
pub mod types;

pub use auth::{parse_redirect, AuthConfig, AuthManager, DRIVE_SCOPE};
pub use client::DriveClient;
pub use config::DriveConfig;
pub use endpoints::{Endpoint, EndpointTable, PathParams};
pub use params::{
    CopyRequest, GranteeType, ListParams, MetadataUpdate, MoveParams, NewPermission, Role,
    UploadMetadata,
};
pub use query::{build_filter, DriveQuery, ItemKind, MatchMode, Parent, Quoting};
pub use token::TokenStore;
pub use types::{About, DriveFile, DriveUser, FileList, Permission, PermissionList, StorageQuota};
