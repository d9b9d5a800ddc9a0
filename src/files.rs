use std::io::Write;
use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::scan::ScanReport;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("NoFilesFound")]
    NoFilesFound { pattern: String },
    #[error("FileNotFound: {0}")]
    NotFound(String),
    #[error("UnsupportedType: {0}")]
    UnsupportedType(String),
    #[error("ReadFailed: {0}")]
    Read(String),
}

/// Enumerate extracted-text documents with a glob pattern (e.g., "./input/**/*.txt").
/// Returns a sorted list of paths.
pub fn enumerate_documents(glob_pattern: &str) -> Result<Vec<PathBuf>, DocumentError> {
    let root = if Path::new(glob_pattern).is_absolute() { "/" } else { "." };
    let pat = glob_pattern.trim_start_matches("./");
    let no_files = || DocumentError::NoFilesFound { pattern: glob_pattern.to_string() };
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(root, &[pat])
        .case_insensitive(false)
        .follow_links(false)
        .build()
        .map_err(|_| no_files())?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    paths.retain(|p| p.is_file());

    if paths.is_empty() {
        return Err(no_files());
    }
    Ok(paths)
}

/// Load an already-extracted text document. Anything but `.txt` is rejected
/// before scanning.
pub fn read_document(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound(path.display().to_string()));
    }
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("txt"));
    if !is_txt {
        return Err(DocumentError::UnsupportedType(path.display().to_string()));
    }
    let bytes = std::fs::read(path).map_err(|e| DocumentError::Read(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DocumentError::Read(format!("{}: {}", path.display(), e)))
}

/// Slug of the file stem, used for report file names.
pub fn document_id(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("doc").to_lowercase();
    let mut slug = String::with_capacity(stem.len());
    for ch in stem.chars() {
        let ch = if ch.is_ascii_alphanumeric() { ch } else { '-' };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "doc".to_string()
    } else {
        slug.to_string()
    }
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

/// SHA-256 over the serialized results, stable across identical runs.
pub fn report_fingerprint(report: &ScanReport) -> Result<String, EmitError> {
    let bytes = serde_json::to_vec(&report.results).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// Atomically write `<doc_id>.refs.json` into outdir.
pub fn emit_report(report: &ScanReport, outdir: &Path, doc_id: &str) -> Result<PathBuf, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let path = outdir.join(format!("{}.refs.json", doc_id));

    let body = serde_json::json!({
        "doc_id": doc_id,
        "results": report.results,
        "het_hieu_luc_count": report.expired_count,
        "fingerprint": report_fingerprint(report)?,
    });
    let bytes = serde_json::to_vec_pretty(&body).map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    tmp.write_all(&bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    tmp.persist(&path).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    Ok(path)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{:02x}", b)).collect()
}
