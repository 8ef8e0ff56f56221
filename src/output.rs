//! Summary files.
//!
//! For a document `id` the writer produces `<id>.txt` (main summary followed
//! by pricing), `<id>.pricing.txt` and `<id>.isolation.txt`. Empty outcomes
//! write nothing.

use crate::summarizer::DocumentSummary;
use std::path::{Path, PathBuf};

/// File-system safe form of a document id.
pub fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Write the three summary files for `id` into `dir`, creating it if needed.
///
/// Either all three files end up in place or none of them does: contents are
/// staged next to their targets and renamed once every write succeeded.
pub fn write_summary(dir: &Path, id: &str, summary: &DocumentSummary) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let stem = file_stem(id);

    let files = [
        (dir.join(format!("{}.txt", stem)), &summary.text),
        (dir.join(format!("{}.pricing.txt", stem)), &summary.pricing_text),
        (dir.join(format!("{}.isolation.txt", stem)), &summary.isolation_text),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (path, content) in files {
        let tmp = staging_path(&path);
        if let Err(e) = std::fs::write(&tmp, content) {
            let _ = std::fs::remove_file(&tmp);
            discard(staged.iter().map(|(tmp, _)| tmp));
            return Err(e);
        }
        staged.push((tmp, path));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, path) {
            discard(written.iter());
            discard(staged[i..].iter().map(|(tmp, _)| tmp));
            return Err(e);
        }
        tracing::debug!("wrote {:?}", path);
        written.push(path.clone());
    }
    Ok(written)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::{Passage, SummaryStats};

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("agency/rfp:12"), "agency_rfp_12");
        assert_eq!(file_stem("rfp-12"), "rfp-12");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let summary = DocumentSummary {
            centrality: vec![Passage::new("scope text", 0)],
            isolation: vec![],
            pricing: vec![Passage::new("$5,000 total", 3)],
            text: "scope text\n$5,000 total".into(),
            pricing_text: "$5,000 total".into(),
            isolation_text: String::new(),
            stats: SummaryStats::default(),
        };

        let written = write_summary(&out, "rfp-1", &summary).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(
            std::fs::read_to_string(out.join("rfp-1.txt")).unwrap(),
            "scope text\n$5,000 total"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("rfp-1.pricing.txt")).unwrap(),
            "$5,000 total"
        );
        assert_eq!(std::fs::read_to_string(out.join("rfp-1.isolation.txt")).unwrap(), "");
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the pricing file should go makes the second rename fail.
        std::fs::create_dir_all(dir.path().join("rfp-1.pricing.txt").join("occupied")).unwrap();
        let summary = DocumentSummary {
            centrality: vec![Passage::new("scope text", 0)],
            isolation: vec![],
            pricing: vec![],
            text: "scope text".into(),
            pricing_text: String::new(),
            isolation_text: String::new(),
            stats: SummaryStats::default(),
        };

        assert!(write_summary(dir.path(), "rfp-1", &summary).is_err());
        assert!(!dir.path().join("rfp-1.txt").exists());
        assert!(!dir.path().join("rfp-1.isolation.txt").exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
