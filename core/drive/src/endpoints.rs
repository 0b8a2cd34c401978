//! Logical endpoint names and URL template resolution.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use drivekit_common::{Error, Result};

/// Google Drive API base URL.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Google Drive upload API base URL.
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const FILE_ID: &str = "{fileId}";
const PERMISSION_ID: &str = "{permissionId}";

/// Characters that must be escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Drive REST operations known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    About,
    FilesList,
    FilesGet,
    FilesDelete,
    FilesCopy,
    FilesUpdate,
    UploadFilesCreate,
    PermissionsCreate,
    PermissionsGet,
    PermissionsList,
    PermissionsDelete,
}

impl Endpoint {
    /// Every endpoint, in table order.
    pub const ALL: [Endpoint; 11] = [
        Endpoint::About,
        Endpoint::FilesList,
        Endpoint::FilesGet,
        Endpoint::FilesDelete,
        Endpoint::FilesCopy,
        Endpoint::FilesUpdate,
        Endpoint::UploadFilesCreate,
        Endpoint::PermissionsCreate,
        Endpoint::PermissionsGet,
        Endpoint::PermissionsList,
        Endpoint::PermissionsDelete,
    ];

    /// Logical name used as the endpoint table key.
    pub fn key(&self) -> &'static str {
        match self {
            Endpoint::About => "about",
            Endpoint::FilesList => "files.list",
            Endpoint::FilesGet => "files.get",
            Endpoint::FilesDelete => "files.delete",
            Endpoint::FilesCopy => "files.copy",
            Endpoint::FilesUpdate => "files.update",
            Endpoint::UploadFilesCreate => "upload.files.create",
            Endpoint::PermissionsCreate => "permissions.create",
            Endpoint::PermissionsGet => "permissions.get",
            Endpoint::PermissionsList => "permissions.list",
            Endpoint::PermissionsDelete => "permissions.delete",
        }
    }

    fn default_template(&self, api_base: &str, upload_base: &str) -> String {
        match self {
            Endpoint::About => format!("{}/about", api_base),
            Endpoint::FilesList => format!("{}/files", api_base),
            Endpoint::FilesGet | Endpoint::FilesDelete | Endpoint::FilesUpdate => {
                format!("{}/files/{}", api_base, FILE_ID)
            }
            Endpoint::FilesCopy => format!("{}/files/{}/copy", api_base, FILE_ID),
            Endpoint::UploadFilesCreate => format!("{}/files", upload_base),
            Endpoint::PermissionsCreate | Endpoint::PermissionsList => {
                format!("{}/files/{}/permissions", api_base, FILE_ID)
            }
            Endpoint::PermissionsGet | Endpoint::PermissionsDelete => format!(
                "{}/files/{}/permissions/{}",
                api_base, FILE_ID, PERMISSION_ID
            ),
        }
    }
}

/// Path parameters substituted into an endpoint template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<'a> {
    pub file_id: Option<&'a str>,
    pub permission_id: Option<&'a str>,
}

impl<'a> PathParams<'a> {
    /// No path parameters.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parameters addressing a single file.
    pub fn file(file_id: &'a str) -> Self {
        Self {
            file_id: Some(file_id),
            permission_id: None,
        }
    }

    /// Parameters addressing a permission on a file.
    pub fn permission(file_id: &'a str, permission_id: &'a str) -> Self {
        Self {
            file_id: Some(file_id),
            permission_id: Some(permission_id),
        }
    }
}

/// Mapping from logical endpoint name to URL template.
///
/// Templates may contain `{fileId}` and `{permissionId}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTable {
    templates: BTreeMap<String, String>,
}

impl EndpointTable {
    /// Table with no entries.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Default table rooted at the given API and upload base URLs.
    pub fn with_bases(api_base: &str, upload_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        let upload_base = upload_base.trim_end_matches('/');

        let templates = Endpoint::ALL
            .iter()
            .map(|endpoint| {
                (
                    endpoint.key().to_string(),
                    endpoint.default_template(api_base, upload_base),
                )
            })
            .collect();

        Self { templates }
    }

    /// Override or add a single template.
    pub fn set(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(name.into(), template.into());
    }

    /// Builder form of [`EndpointTable::set`].
    pub fn with(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.set(name, template);
        self
    }

    /// Overlay entries from another table on top of this one.
    pub fn merge(&mut self, overrides: EndpointTable) {
        self.templates.extend(overrides.templates);
    }

    /// Look up a raw template.
    pub fn template(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Resolve a logical endpoint name into a concrete URL.
    ///
    /// Substituted IDs are percent-encoded as a single path segment.
    ///
    /// # Errors
    /// - `Configuration` if `name` is not in the table
    /// - `Configuration` if the template needs a path parameter that was not given
    /// - `InvalidInput` if an ID is empty, `.` or `..`
    pub fn resolve(&self, name: &str, params: &PathParams<'_>) -> Result<String> {
        let template = self.template(name).ok_or_else(|| {
            Error::Configuration(format!("Unknown endpoint '{}'", name))
        })?;

        let mut url = template.to_string();

        if url.contains(PERMISSION_ID) {
            let permission_id = params.permission_id.ok_or_else(|| {
                Error::Configuration(format!("Endpoint '{}' requires a permissionId", name))
            })?;
            url = url.replace(PERMISSION_ID, &encode_segment("permissionId", permission_id)?);
        }

        if url.contains(FILE_ID) {
            let file_id = params.file_id.ok_or_else(|| {
                Error::Configuration(format!("Endpoint '{}' requires a fileId", name))
            })?;
            url = url.replace(FILE_ID, &encode_segment("fileId", file_id)?);
        }

        Ok(url)
    }

    /// Resolve a known endpoint.
    pub fn url(&self, endpoint: Endpoint, params: &PathParams<'_>) -> Result<String> {
        self.resolve(endpoint.key(), params)
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::with_bases(DRIVE_API_BASE, DRIVE_UPLOAD_BASE)
    }
}

/// Dot segments are normalized away by URL parsers (`%2e` included), so they
/// are refused rather than encoded.
fn encode_segment(param: &str, value: &str) -> Result<String> {
    if matches!(value, "" | "." | "..") {
        return Err(Error::InvalidInput(format!(
            "{} '{}' is not a valid path segment",
            param, value
        )));
    }
    Ok(utf8_percent_encode(value, PATH_SEGMENT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_endpoint() {
        let table = EndpointTable::default();
        for endpoint in Endpoint::ALL {
            assert!(
                table.template(endpoint.key()).is_some(),
                "missing {}",
                endpoint.key()
            );
        }
    }

    #[test]
    fn test_resolve_file_id() {
        let table = EndpointTable::default();
        let url = table.resolve("files.get", &PathParams::file("X")).unwrap();
        assert_eq!(url, "https://www.googleapis.com/drive/v3/files/X");
    }

    #[test]
    fn test_resolve_without_placeholder_is_unchanged() {
        let table = EndpointTable::empty().with("files.about", "https://example.test/drive/about");
        let url = table.resolve("files.about", &PathParams::none()).unwrap();
        assert_eq!(url, "https://example.test/drive/about");
    }

    #[test]
    fn test_resolve_permission_substitutes_both() {
        let table = EndpointTable::default();
        let url = table
            .url(Endpoint::PermissionsGet, &PathParams::permission("F1", "P9"))
            .unwrap();
        assert_eq!(
            url,
            "https://www.googleapis.com/drive/v3/files/F1/permissions/P9"
        );
    }

    #[test]
    fn test_resolve_unknown_name() {
        let table = EndpointTable::default();
        let err = table.resolve("files.nope", &PathParams::none()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_missing_file_id() {
        let table = EndpointTable::default();
        let err = table.url(Endpoint::FilesCopy, &PathParams::none()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_permission_requires_both_ids() {
        let table = EndpointTable::default();
        let err = table
            .url(Endpoint::PermissionsDelete, &PathParams::file("F1"))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_escapes_reserved_characters() {
        let table = EndpointTable::default();
        let url = table
            .url(Endpoint::FilesGet, &PathParams::file("a/b?c#d e%"))
            .unwrap();
        assert_eq!(
            url,
            "https://www.googleapis.com/drive/v3/files/a%2Fb%3Fc%23d%20e%25"
        );
    }

    #[test]
    fn test_substituted_id_cannot_inject_placeholder() {
        let table = EndpointTable::default();
        let url = table
            .url(
                Endpoint::PermissionsGet,
                &PathParams::permission("F1", "{fileId}"),
            )
            .unwrap();
        assert!(url.ends_with("/files/F1/permissions/%7BfileId%7D"));
    }

    #[test]
    fn test_dot_segment_ids_are_rejected() {
        let table = EndpointTable::default();
        for id in ["", ".", ".."] {
            let err = table
                .url(Endpoint::FilesDelete, &PathParams::file(id))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "fileId {:?}", id);

            let err = table
                .url(Endpoint::PermissionsDelete, &PathParams::permission("F1", id))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "permissionId {:?}", id);
        }
    }

    #[test]
    fn test_ids_containing_dots_are_kept() {
        let table = EndpointTable::default();
        let url = table
            .url(Endpoint::FilesGet, &PathParams::file("...a.b"))
            .unwrap();
        assert!(url.ends_with("/files/...a.b"));
    }

    #[test]
    fn test_with_bases_trims_trailing_slash() {
        let table = EndpointTable::with_bases("http://127.0.0.1:1/drive/", "http://127.0.0.1:1/up/");
        assert_eq!(
            table.template("files.list"),
            Some("http://127.0.0.1:1/drive/files")
        );
        assert_eq!(
            table.template("upload.files.create"),
            Some("http://127.0.0.1:1/up/files")
        );
    }

    #[test]
    fn test_merge_overrides_single_entry() {
        let mut table = EndpointTable::default();
        table.merge(EndpointTable::empty().with("about", "http://localhost/about"));
        assert_eq!(table.template("about"), Some("http://localhost/about"));
        assert_eq!(
            table.template("files.list"),
            Some("https://www.googleapis.com/drive/v3/files")
        );
    }
}
