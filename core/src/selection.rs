use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions the generation service accepts, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "js", "py", "java", "cpp", "c", "html", "css", "php", "rb", "go", "rs", "ts", "jsx", "tsx",
    "vue", "svelte", "md", "txt", "json", "xml", "yaml", "yml", "toml", "ini", "sh", "bat", "ps1",
    "sql", "r", "scala", "kt", "swift", ARCHIVE_EXTENSION,
];

/// The one archive extension; archives are expanded server-side.
pub const ARCHIVE_EXTENSION: &str = "zip";

pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(extension))
}

/// One eligible file in the current batch. Derived from a picked path,
/// never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub byte_size: u64,
    pub extension: String,
}

impl SelectedFile {
    /// Builds a `SelectedFile` from a picked path, or `None` when the
    /// extension is not in the supported set.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if !is_supported_extension(&extension) {
            return None;
        }
        let byte_size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        Some(Self {
            name,
            path,
            byte_size,
            extension,
        })
    }

    pub fn is_archive(&self) -> bool {
        self.extension == ARCHIVE_EXTENSION
    }

    /// Human-readable size label for the file list.
    pub fn display_size(&self) -> String {
        const MB: u64 = 1024 * 1024;
        if self.byte_size > MB {
            format!("{:.1} MB", self.byte_size as f64 / MB as f64)
        } else {
            format!("{:.1} KB", self.byte_size as f64 / 1024.0)
        }
    }
}

/// Outcome of a successful batch replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub accepted: usize,
    pub archives: usize,
}

impl SelectionUpdate {
    /// Informational notice shown when the batch contains archives.
    pub fn archive_notice(&self) -> Option<String> {
        if self.archives == 0 {
            return None;
        }
        Some(format!(
            "Found {} ZIP file(s). The system will automatically extract and analyze all code files within these folders.",
            self.archives
        ))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no eligible files in the picked batch")]
    NoEligibleFiles,
}

impl SelectionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoEligibleFiles => {
                "Please select code files or ZIP folders with supported extensions.".to_string()
            }
        }
    }
}

/// The ordered batch of files currently chosen for generation.
/// Insertion order is display and removal order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    files: Vec<SelectedFile>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole selection with the eligible members of `batch`,
    /// preserving their relative order. Each picking gesture replaces the
    /// prior batch rather than appending to it.
    ///
    /// When no member of `batch` is eligible the selection is left untouched
    /// and `NoEligibleFiles` is returned.
    pub fn replace<I, P>(&mut self, batch: I) -> Result<SelectionUpdate, SelectionError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let eligible: Vec<SelectedFile> = batch
            .into_iter()
            .filter_map(|path| SelectedFile::from_path(path.as_ref()))
            .collect();
        if eligible.is_empty() {
            return Err(SelectionError::NoEligibleFiles);
        }
        let archives = eligible.iter().filter(|file| file.is_archive()).count();
        let accepted = eligible.len();
        self.files = eligible;
        Ok(SelectionUpdate { accepted, archives })
    }

    /// Removes exactly one entry. Out-of-range indices are ignored.
    /// Returns true when the selection became empty as a result, which is
    /// the signal for dependent panels to collapse.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index < self.files.len() {
            self.files.remove(index);
        }
        self.files.is_empty()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
