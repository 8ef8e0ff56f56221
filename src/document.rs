//! Documents and batch inputs.
//!
//! A document is a solicitation title, an optional description and the text
//! of its attachments. Batches come from a JSON manifest or from a directory
//! tree with one subdirectory per document.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Separator placed between attachment texts.
pub const ATTACHMENT_SEPARATOR: &str = " | ";

const TITLE_FILE: &str = "title.txt";
const DESCRIPTION_FILE: &str = "description.txt";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Document {0:?} has no title")]
    MissingTitle(String),

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

fn read(path: &Path) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// One solicitation to summarize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub attachments: Vec<String>,
}

impl Document {
    /// Document with a random id.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            attachments: vec![text.into()],
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Non-blank description, trimmed.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Non-empty attachment texts joined with [`ATTACHMENT_SEPARATOR`].
    pub fn combined_text(&self) -> String {
        self.attachments
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(ATTACHMENT_SEPARATOR)
    }
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    attachments: Vec<PathBuf>,
}

/// Load a JSON manifest. Attachment paths are relative to the manifest.
pub fn load_manifest(path: &Path) -> Result<Vec<Document>, DocumentError> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let entries: Vec<ManifestEntry> = serde_json::from_str(&read(path)?)?;

    entries
        .into_iter()
        .map(|entry| {
            let id = entry.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            if entry.title.trim().is_empty() {
                return Err(DocumentError::MissingTitle(id));
            }
            let mut attachments = Vec::new();
            if let Some(text) = entry.text {
                attachments.push(text);
            }
            for rel in &entry.attachments {
                attachments.push(read(&base.join(rel))?);
            }
            Ok(Document {
                id,
                title: entry.title,
                description: entry.description,
                attachments,
            })
        })
        .collect()
}

fn sorted_entries(dir: &Path) -> Result<Vec<walkdir::DirEntry>, DocumentError> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|e| {
            e.map_err(|source| DocumentError::Walk {
                path: dir.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Load one document per subdirectory of `root`.
///
/// Each subdirectory needs a `title.txt`; `description.txt` is optional and
/// every other `*.txt` file is an attachment, in file-name order.
/// Subdirectories without a title are skipped with a warning.
pub fn load_directory(root: &Path) -> Result<Vec<Document>, DocumentError> {
    let mut documents = Vec::new();

    for dir in sorted_entries(root)?.into_iter().filter(|e| e.file_type().is_dir()) {
        let id = dir.file_name().to_string_lossy().to_string();
        let title_path = dir.path().join(TITLE_FILE);
        if !title_path.is_file() {
            tracing::warn!(document = %id, "skipping directory without {}", TITLE_FILE);
            continue;
        }

        let title = read(&title_path)?.trim().to_string();
        let description_path = dir.path().join(DESCRIPTION_FILE);
        let description = if description_path.is_file() {
            Some(read(&description_path)?)
        } else {
            None
        };

        let mut attachments = Vec::new();
        for file in sorted_entries(dir.path())? {
            let name = file.file_name().to_string_lossy();
            let is_text = file.path().extension().is_some_and(|ext| ext == "txt");
            if file.file_type().is_file() && is_text && name != TITLE_FILE && name != DESCRIPTION_FILE {
                attachments.push(read(file.path())?);
            }
        }

        documents.push(Document {
            id,
            title,
            description,
            attachments,
        });
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_skips_blank_attachments() {
        let doc = Document {
            id: "rfp-1".into(),
            title: "Network upgrade".into(),
            description: Some("   ".into()),
            attachments: vec!["first".into(), "  ".into(), "second\n".into()],
        };
        assert_eq!(doc.combined_text(), "first | second");
        assert_eq!(doc.description(), None);
    }

    #[test]
    fn test_builder() {
        let doc = Document::new("Title", "body")
            .with_id("abc")
            .with_description(" desc ");
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.description(), Some("desc"));
        assert_eq!(doc.combined_text(), "body");
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sow.txt"), "statement of work").unwrap();
        std::fs::write(
            dir.path().join("manifest.json"),
            r#"[
                {"id": "a", "title": "Janitorial services", "text": "inline body", "attachments": ["sow.txt"]},
                {"title": "No id", "description": "d"}
            ]"#,
        )
        .unwrap();

        let docs = load_manifest(&dir.path().join("manifest.json")).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].combined_text(), "inline body | statement of work");
        assert!(!docs[1].id.is_empty());
        assert_eq!(docs[1].description(), Some("d"));
        assert_eq!(docs[1].combined_text(), "");
    }

    #[test]
    fn test_manifest_rejects_blank_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, r#"[{"id": "x", "title": "  "}]"#).unwrap();
        assert!(matches!(load_manifest(&path), Err(DocumentError::MissingTitle(id)) if id == "x"));
    }

    #[test]
    fn test_load_directory() {
        let root = tempfile::tempdir().unwrap();
        let doc = root.path().join("rfp-42");
        std::fs::create_dir(&doc).unwrap();
        std::fs::write(doc.join("title.txt"), "Road resurfacing\n").unwrap();
        std::fs::write(doc.join("description.txt"), "Resurface county roads").unwrap();
        std::fs::write(doc.join("b.txt"), "second").unwrap();
        std::fs::write(doc.join("a.txt"), "first").unwrap();
        std::fs::write(doc.join("notes.md"), "ignored").unwrap();
        std::fs::create_dir(root.path().join("untitled")).unwrap();

        let docs = load_directory(root.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "rfp-42");
        assert_eq!(docs[0].title, "Road resurfacing");
        assert_eq!(docs[0].description(), Some("Resurface county roads"));
        assert_eq!(docs[0].combined_text(), "first | second");
    }
}
