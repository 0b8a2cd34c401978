//! Query-string and JSON body builders.
//!
//! Every optional field is skipped when `None`: the Drive API treats an
//! explicit empty value differently from an omitted one.

use serde::Serialize;

use crate::query::DriveQuery;

/// Query parameters for `files.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<String>,
    /// Partial response selector, e.g. `nextPageToken,files(id,name)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl ListParams {
    /// Parameters with only a search expression set.
    pub fn query(query: &DriveQuery) -> Self {
        Self {
            q: Some(query.build()),
            ..Self::default()
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from a previous page.
    pub fn with_page_token(mut self, page_token: impl Into<String>) -> Self {
        self.page_token = Some(page_token.into());
        self
    }

    /// Set the sort order.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
}

/// JSON body for `files.copy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

impl CopyRequest {
    /// Build a copy body from an optional new name and target folder.
    pub fn new(name: Option<&str>, target_folder: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            parents: target_folder.map(|folder| vec![folder.to_string()]),
        }
    }
}

/// Query parameters for moving a file between folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_parents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_parents: Option<String>,
}

impl MoveParams {
    /// Move from one folder to another.
    pub fn between(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            add_parents: Some(to.into()),
            remove_parents: Some(from.into()),
        }
    }

    /// Check whether the move would change anything.
    pub fn is_empty(&self) -> bool {
        self.add_parents.is_none() && self.remove_parents.is_none()
    }
}

/// JSON body for a metadata update via `files.update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
}

impl MetadataUpdate {
    /// Check whether the update sets no fields.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Metadata part of a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Role granted by a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

/// Grantee type of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GranteeType {
    User,
    Group,
    Domain,
    Anyone,
}

/// JSON body for `permissions.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPermission {
    pub role: Role,
    #[serde(rename = "type")]
    pub grantee_type: GranteeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl NewPermission {
    /// Grant `role` to a single user.
    pub fn user(role: Role, email_address: impl Into<String>) -> Self {
        Self {
            role,
            grantee_type: GranteeType::User,
            email_address: Some(email_address.into()),
            domain: None,
        }
    }

    /// Grant `role` to anyone with the link.
    pub fn anyone(role: Role) -> Self {
        Self {
            role,
            grantee_type: GranteeType::Anyone,
            email_address: None,
            domain: None,
        }
    }
}
