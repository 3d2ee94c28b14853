//! Downloadable summary artifact.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A summary written to disk and encoded for inline download.
#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    /// Where the summary was written.
    pub path: PathBuf,
    /// File name offered to the browser.
    pub filename: String,
    /// Base64 encoding of the file's bytes.
    pub base64: String,
}

impl SummaryArtifact {
    /// `data:` URI carrying the file.
    pub fn data_uri(&self) -> String {
        format!("data:file/txt;base64,{}", self.base64)
    }

    /// HTML anchor that downloads the file.
    pub fn download_link(&self) -> String {
        format!(
            "<a href=\"{}\" download=\"{}\">Download Summary</a>",
            self.data_uri(),
            self.filename
        )
    }
}

/// Write the summary to `dir/filename`, overwriting any previous file, and
/// encode what was written.
#[instrument(skip(summary), fields(dir = %dir.display()))]
pub fn save_summary(summary: &str, dir: &Path, filename: &str) -> Result<SummaryArtifact> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);

    std::fs::write(&path, summary)?;
    let bytes = std::fs::read(&path)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());

    Ok(SummaryArtifact {
        path,
        filename: filename.to_string(),
        base64: STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_summary() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = save_summary("Short summary.", dir.path(), "summary.txt").unwrap();

        assert_eq!(artifact.path, dir.path().join("summary.txt"));
        assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "Short summary.");
        assert_eq!(artifact.base64, "U2hvcnQgc3VtbWFyeS4=");
        assert_eq!(
            artifact.download_link(),
            "<a href=\"data:file/txt;base64,U2hvcnQgc3VtbWFyeS4=\" download=\"summary.txt\">Download Summary</a>"
        );
    }

    #[test]
    fn test_save_overwrites_previous_summary() {
        let dir = tempfile::tempdir().unwrap();
        save_summary("A much longer first summary", dir.path(), "summary.txt").unwrap();
        let artifact = save_summary("Second", dir.path(), "summary.txt").unwrap();

        assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "Second");
        assert_eq!(STANDARD.decode(&artifact.base64).unwrap(), b"Second");
    }

    #[test]
    fn test_unicode_round_trips_through_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = save_summary("Résumé — naïve café", dir.path(), "summary.txt").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(&artifact.base64).unwrap()).unwrap();
        assert_eq!(decoded, "Résumé — naïve café");
    }
}
