//! Folder handles
//!
//! A [`Folder`] describes one remote mail folder: the raw server
//! name, the display name after policy translation, the hierarchy
//! delimiter, and the server-reported name attributes.
//!
//! Discovery is generic over the handle type it constructs (the
//! [`FolderHandle`] trait), so a repository variant can produce a
//! richer handle from the same raw inputs. [`MappedFolder`] is the
//! variant that carries a persistent UID-mapping overlay.

use serde::Serialize;
use std::fmt;

/// The raw inputs every folder handle is built from.
pub trait FolderHandle: Send + Sync + Sized {
    /// Build a handle from one discovered or included folder.
    fn from_parts(
        name: String,
        visible_name: String,
        delimiter: Option<char>,
        attributes: Vec<String>,
    ) -> Self;

    /// The raw server name.
    fn name(&self) -> &str;

    /// The display name used for sorting and presentation.
    fn visible_name(&self) -> &str;
}

/// A remote mail folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    name: String,
    visible_name: String,
    delimiter: Option<char>,
    attributes: Vec<String>,
}

impl Folder {
    /// The hierarchy delimiter reported alongside this folder, if
    /// any.
    #[must_use]
    pub const fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// Server-reported name attributes, verbatim.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Whether the folder can be selected. Non-selectable namespace
    /// nodes are normally dropped during discovery already.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case("\\noselect"))
    }
}

impl FolderHandle for Folder {
    fn from_parts(
        name: String,
        visible_name: String,
        delimiter: Option<char>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            name,
            visible_name,
            delimiter,
            attributes,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn visible_name(&self) -> &str {
        &self.visible_name
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.visible_name)
    }
}

/// A folder handle that additionally carries a persistent UID-map
/// overlay between the local and remote UID spaces. The mapping
/// itself is maintained by the synchronization layer; this handle
/// names the overlay file it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedFolder {
    folder: Folder,
    uid_map_name: String,
}

impl MappedFolder {
    /// The file name of the UID-map overlay for this folder.
    #[must_use]
    pub fn uid_map_name(&self) -> &str {
        &self.uid_map_name
    }

    /// Access the plain folder descriptor.
    #[must_use]
    pub const fn folder(&self) -> &Folder {
        &self.folder
    }
}

impl FolderHandle for MappedFolder {
    fn from_parts(
        name: String,
        visible_name: String,
        delimiter: Option<char>,
        attributes: Vec<String>,
    ) -> Self {
        // Delimiters in raw names would produce nested overlay
        // paths; flatten them.
        let uid_map_name = name.replace(['/', '.'], "_");
        Self {
            folder: Folder::from_parts(name, visible_name, delimiter, attributes),
            uid_map_name,
        }
    }

    fn name(&self) -> &str {
        self.folder.name()
    }

    fn visible_name(&self) -> &str {
        self.folder.visible_name()
    }
}

impl fmt::Display for MappedFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.folder.fmt(f)
    }
}
