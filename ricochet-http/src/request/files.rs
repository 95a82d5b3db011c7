//! Uploaded file value objects.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// An uploaded file as described by the transport.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct File {
    /// Client-provided file name.
    pub name: String,
    /// Client-provided MIME type. Untrusted.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
    /// Temporary upload location, when the transport spooled the body.
    pub tmp_name: Option<PathBuf>,
    /// Final location, when the file already lives on disk.
    pub pathname: Option<PathBuf>,
    /// Transport-level upload error code, if any.
    pub error: Option<u32>,
}

impl File {
    /// Whether the upload completed and its bytes are reachable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
            && self.size > 0
            && (self.tmp_name.is_some() || self.pathname.as_deref().is_some_and(Path::exists))
    }
}

/// The uploaded files of a request, keyed by field identifier.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileList {
    files: IndexMap<String, File>,
}

impl FileList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, file: File) {
        self.files.insert(id.into(), file);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&File> {
        self.files.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &File)> {
        self.files.iter().map(|(id, file)| (id.as_str(), file))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<(String, File)> for FileList {
    fn from_iter<I: IntoIterator<Item = (String, File)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
