//! Run-history log.
//!
//! Every `distill` invocation appends a run header with its parameters and
//! one line per document to `<data_dir>/rfp-distill/distill.log`.

use crate::config::AppConfig;
use crate::summarizer::SummaryOutcome;
use chrono::Local;
use lazy_static::lazy_static;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

/// Initialize the log file at the default location
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_at(&get_log_path())
}

/// Initialize the log file at `log_path`
pub fn init_logger_at(log_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let mut log_file = LOG_FILE
        .lock()
        .map_err(|_| anyhow::anyhow!("log file lock poisoned"))?;
    *log_file = Some(file);

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    if let Some(ref mut f) = *log_file {
        let _ = writeln!(f, "\n=== Distill Run Started at {} ===", timestamp);
    }

    Ok(())
}

/// Get the log file path
fn get_log_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("rfp-distill").join("distill.log")
    } else {
        PathBuf::from("distill.log")
    }
}

/// Log a message to file
pub fn log(level: &str, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let formatted = format!("[{}] {}: {}", timestamp, level, message);

    if let Ok(mut log_file) = LOG_FILE.lock() {
        if let Some(ref mut f) = *log_file {
            let _ = writeln!(f, "{}", formatted);
            let _ = f.flush();
        }
    }
}

/// Record the parameters a run was started with
pub fn log_run_header(config: &AppConfig, aspect_store: &Path) {
    let s = &config.summarizer;
    crate::log_info!(
        "strategy={} segmentation={} min_len={} max_len={} chunk_len={}",
        s.strategy,
        s.segmentation,
        s.min_len,
        s.max_len,
        s.chunk_len
    );
    crate::log_info!(
        "edge_percentile={} aspect_percentile={} centrality_percentile={} pricing_percentile={}",
        s.edge_percentile,
        s.aspect_percentile,
        s.centrality_percentile,
        s.pricing_percentile
    );
    crate::log_info!(
        "tiny_cluster_size={} mmr_isolation_threshold={} weights=({}, {}, {}) seed={}",
        s.tiny_cluster_size,
        s.mmr_isolation_threshold,
        s.weights.title,
        s.weights.description,
        s.weights.aspect,
        s.partition_seed
    );
    crate::log_info!(
        "embedding={} aspects={} output_dir={}",
        config.embedding.backend,
        aspect_store.display(),
        config.output_dir.display()
    );
}

/// Record the outcome for one document
pub fn log_outcome(document_id: &str, outcome: &SummaryOutcome) {
    match outcome {
        SummaryOutcome::Summary(summary) => {
            let st = &summary.stats;
            crate::log_info!(
                "{}: chars={} passages={} money={} edges={} clusters={} selected_clusters={} centrality={} isolation={} pricing={} summary_chars={}",
                document_id,
                st.normalized_len,
                st.passages,
                st.money_passages,
                st.edges,
                st.cluster_sizes.len(),
                st.selected_clusters,
                st.centrality_selected,
                st.isolation_selected,
                st.pricing_selected,
                st.summary_len
            );
        }
        SummaryOutcome::Empty(reason) => {
            crate::log_warn!("{}: {}", document_id, reason);
        }
    }
}

/// Macros for easier logging
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log("INFO", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log("DEBUG", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log("WARN", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log("ERROR", &format!($($arg)*));
    };
}

/// Get the current log file path for display
pub fn get_log_path_display() -> String {
    get_log_path().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::EmptyReason;

    #[test]
    fn test_run_log_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("distill.log");
        init_logger_at(&path).unwrap();

        log_run_header(&AppConfig::default(), Path::new("aspects.bin"));
        log_outcome("rfp-7", &SummaryOutcome::Empty(EmptyReason::Ungraphed));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("=== Distill Run Started"));
        assert!(content.contains("edge_percentile=75"));
        assert!(content.contains("WARN: rfp-7: no similar passages"));
    }
}
