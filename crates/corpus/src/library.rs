//! The reference library: preloaded policy documents plus the destination table.

use crate::extract::DocumentExtractor;
use crate::table::DestinationTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use tripcover_config::ReferenceConfig;
use tripcover_core::error::CorpusError;

/// Raw text of one reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// File name the text came from; also the dedup key
    pub source: String,
    pub text: String,
}

impl CorpusEntry {
    /// The entry as a labelled block for the assembled context.
    pub fn to_context_text(&self) -> String {
        format!("Travel insurance policy data from {}:\n{}", self.source, self.text)
    }
}

/// Preloaded documents keyed by file name, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Returns `false` without touching the corpus if an entry
    /// with the same source name is already present.
    pub fn insert(&mut self, entry: CorpusEntry) -> bool {
        if self.contains(&entry.source) {
            debug!(source = %entry.source, "Corpus entry already loaded, skipping");
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Extract and add a document. An already-loaded file name is not
    /// re-extracted.
    pub fn load_document(
        &mut self,
        path: &Path,
        extractor: &dyn DocumentExtractor,
    ) -> Result<bool, CorpusError> {
        let source = source_name(path);
        if self.contains(&source) {
            debug!(source = %source, "Corpus entry already loaded, skipping");
            return Ok(false);
        }

        let text = extractor.extract(path)?;
        Ok(self.insert(CorpusEntry { source, text }))
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.iter().any(|e| e.source == source)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A document the user supplied during the session. At most one per session;
/// a new upload replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    pub text: String,
}

impl UploadedDocument {
    pub fn from_path(path: &Path, extractor: &dyn DocumentExtractor) -> Result<Self, CorpusError> {
        let text = extractor.extract(path)?;
        Ok(Self {
            name: source_name(path),
            text,
        })
    }

    pub fn to_context_text(&self) -> String {
        format!("The user uploaded a PDF. Here is the content:\n{}", self.text)
    }
}

/// Read-only reference material shared by every session.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    pub corpus: Corpus,
    pub destinations: Option<DestinationTable>,
}

impl ReferenceLibrary {
    /// Load everything the config names. Missing files are skipped; files
    /// that exist but cannot be read are logged and skipped. Returns the
    /// library plus user-facing notices for what did load.
    pub fn load(config: &ReferenceConfig, extractor: &dyn DocumentExtractor) -> (Self, Vec<String>) {
        let mut library = Self::default();
        let mut notices = Vec::new();

        for path in config.document_paths() {
            if !path.exists() {
                debug!(path = %path.display(), "Reference document not found, skipping");
                continue;
            }
            match library.corpus.load_document(&path, extractor) {
                Ok(true) => {
                    let name = source_name(&path);
                    info!(source = %name, "Reference document loaded");
                    notices.push(format!("{name} loaded!"));
                }
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load reference document"),
            }
        }

        let table_path = config.destination_table_path();
        if !table_path.exists() {
            debug!(path = %table_path.display(), "Destination table not found, skipping");
        } else {
            match DestinationTable::load(&table_path) {
                Ok(table) => {
                    info!(rows = table.len(), "Destination list loaded");
                    notices.push("Destination list loaded!".to_string());
                    library.destinations = Some(table);
                }
                Err(e) => warn!(path = %table_path.display(), error = %e, "Failed to load destination table"),
            }
        }

        (library, notices)
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns fixed text and counts how often it was asked.
    struct CountingExtractor {
        calls: AtomicUsize,
    }

    impl CountingExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentExtractor for CountingExtractor {
        fn extract(&self, path: &Path) -> Result<String, CorpusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("text of {}", source_name(path)))
        }
    }

    #[test]
    fn duplicate_document_load_is_a_no_op() {
        let extractor = CountingExtractor::new();
        let mut corpus = Corpus::new();
        let path = Path::new("/policies/TravelEasy Policy QTD032212.pdf");

        assert!(corpus.load_document(path, &extractor).unwrap());
        assert!(!corpus.load_document(path, &extractor).unwrap());

        assert_eq!(corpus.len(), 1);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn insert_keeps_load_order() {
        let mut corpus = Corpus::new();
        for name in ["b.pdf", "a.pdf", "c.pdf"] {
            corpus.insert(CorpusEntry {
                source: name.into(),
                text: String::new(),
            });
        }
        let order: Vec<&str> = corpus.entries().iter().map(|e| e.source.as_str()).collect();
        assert_eq!(order, vec!["b.pdf", "a.pdf", "c.pdf"]);
    }

    #[test]
    fn entry_context_text_is_labelled() {
        let entry = CorpusEntry {
            source: "Scootsurance QSR022206_updated.pdf".into(),
            text: "Plan benefits".into(),
        };
        assert_eq!(
            entry.to_context_text(),
            "Travel insurance policy data from Scootsurance QSR022206_updated.pdf:\nPlan benefits"
        );
    }

    #[test]
    fn uploaded_document_from_path() {
        let extractor = CountingExtractor::new();
        let doc = UploadedDocument::from_path(Path::new("/tmp/my-policy.pdf"), &extractor).unwrap();
        assert_eq!(doc.name, "my-policy.pdf");
        assert!(doc.to_context_text().starts_with("The user uploaded a PDF. Here is the content:\n"));
    }

    #[test]
    fn load_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReferenceConfig {
            base_dir: dir.path().to_path_buf(),
            ..ReferenceConfig::default()
        };

        let extractor = CountingExtractor::new();
        let (library, notices) = ReferenceLibrary::load(&config, &extractor);

        assert!(library.corpus.is_empty());
        assert!(library.destinations.is_none());
        assert!(notices.is_empty());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn load_reports_what_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wording.txt"), "Section 1: Medical").unwrap();
        std::fs::write(
            dir.path().join("destinations.csv"),
            "Region,Country,Country Code\nNorth Asia,Japan,JP\n",
        )
        .unwrap();

        let config = ReferenceConfig {
            base_dir: dir.path().to_path_buf(),
            documents: vec!["wording.txt".into(), "absent.pdf".into(), "wording.txt".into()],
            destination_table: "destinations.csv".into(),
        };

        let (library, notices) = ReferenceLibrary::load(&config, &crate::StandardExtractor);

        assert_eq!(library.corpus.len(), 1);
        assert_eq!(library.corpus.entries()[0].text, "Section 1: Medical");
        assert_eq!(library.destinations.as_ref().map(|t| t.len()), Some(1));
        assert_eq!(notices, vec!["wording.txt loaded!", "Destination list loaded!"]);
    }

    #[test]
    fn unreadable_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

        let config = ReferenceConfig {
            base_dir: dir.path().to_path_buf(),
            documents: vec!["broken.pdf".into()],
            destination_table: "none.xlsx".into(),
        };

        let (library, notices) = ReferenceLibrary::load(&config, &crate::StandardExtractor);
        assert!(library.corpus.is_empty());
        assert!(notices.is_empty());
    }
}
