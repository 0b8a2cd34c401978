//! Drive search expressions for the `q` parameter of `files.list`.
//!
//! The composer produces clauses in a fixed order:
//! parent, MIME type, trashed, name. For example
//!
//! ```text
//! 'F1' in parents and mimeType != 'application/vnd.google-apps.folder' and trashed = false and name = 'report'
//! ```

use std::fmt;

use drivekit_common::FOLDER_MIME_TYPE;

/// Sentinel parent ID meaning "do not restrict by parent".
pub const ALL_PARENTS: &str = "all";

/// Which parent folder a listing is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Parent {
    /// Any parent.
    #[default]
    All,
    /// Direct children of the given folder ID.
    Folder(String),
}

impl Parent {
    /// Interpret an optional parent ID, treating `"all"` as [`Parent::All`].
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            None | Some(ALL_PARENTS) => Parent::All,
            Some(id) => Parent::Folder(id.to_string()),
        }
    }
}

/// Which kinds of item a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    /// Files and folders alike.
    #[default]
    Any,
    /// Only folders.
    Folders,
    /// Everything that is not a folder.
    Files,
}

impl ItemKind {
    /// Map the boolean "want folders" switch onto an item kind.
    pub fn from_want_folders(want_folders: bool) -> Self {
        if want_folders {
            ItemKind::Folders
        } else {
            ItemKind::Files
        }
    }
}

/// How a name filter is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// `name = '<value>'`
    #[default]
    Exact,
    /// `name contains '<value>'`
    Contains,
    /// `not name contains '<value>'`
    NotEqual,
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchMode::Exact),
            "contains" => Ok(MatchMode::Contains),
            "not_equal" | "not-equal" => Ok(MatchMode::NotEqual),
            other => Err(format!(
                "unknown match mode '{}', expected exact, contains or not_equal",
                other
            )),
        }
    }
}

/// How string values are placed inside single quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    /// Backslash-escape `\` and `'` so any value stays one literal.
    #[default]
    Escaped,
    /// Interpolate values as-is. A value containing `'` yields a broken
    /// or different query.
    Verbatim,
}

impl Quoting {
    fn quote(&self, value: &str) -> String {
        match self {
            Quoting::Escaped => {
                format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Quoting::Verbatim => format!("'{}'", value),
        }
    }
}

/// Builder for a `files.list` search expression.
#[derive(Debug, Clone, Default)]
pub struct DriveQuery {
    parent: Parent,
    kind: ItemKind,
    name: Option<(String, MatchMode)>,
    quoting: Quoting,
}

impl DriveQuery {
    /// Query matching every non-trashed item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to children of a parent.
    pub fn parent(mut self, parent: Parent) -> Self {
        self.parent = parent;
        self
    }

    /// Restrict to direct children of `folder_id`.
    pub fn in_folder(self, folder_id: impl Into<String>) -> Self {
        self.parent(Parent::Folder(folder_id.into()))
    }

    /// Restrict by item kind.
    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Filter on the item name.
    pub fn name(mut self, value: impl Into<String>, mode: MatchMode) -> Self {
        self.name = Some((value.into(), mode));
        self
    }

    /// Choose how values are quoted.
    pub fn quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Render the expression.
    pub fn build(&self) -> String {
        let mut clauses = Vec::with_capacity(4);

        if let Parent::Folder(id) = &self.parent {
            clauses.push(format!("{} in parents", self.quoting.quote(id)));
        }

        match self.kind {
            ItemKind::Folders => clauses.push(format!("mimeType = '{}'", FOLDER_MIME_TYPE)),
            ItemKind::Files => clauses.push(format!("mimeType != '{}'", FOLDER_MIME_TYPE)),
            ItemKind::Any => {}
        }

        clauses.push("trashed = false".to_string());

        if let Some((value, mode)) = &self.name {
            let value = self.quoting.quote(value);
            clauses.push(match mode {
                MatchMode::Exact => format!("name = {}", value),
                MatchMode::Contains => format!("name contains {}", value),
                MatchMode::NotEqual => format!("not name contains {}", value),
            });
        }

        clauses.join(" and ")
    }
}

impl fmt::Display for DriveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Build a filter for the listing family of operations.
///
/// `parent_id` of `None` or `"all"` drops the parent clause. A name filter
/// without a mode compares exactly.
pub fn build_filter(
    parent_id: Option<&str>,
    name_filter: Option<&str>,
    match_mode: Option<MatchMode>,
    want_folders: bool,
) -> String {
    let mut query = DriveQuery::new()
        .parent(Parent::from_id(parent_id))
        .kind(ItemKind::from_want_folders(want_folders));

    if let Some(name) = name_filter {
        query = query.name(name, match_mode.unwrap_or_default());
    }

    query.build()
}
