use std::path::Path;

use tg_domain::error::{Error, Result};

use crate::scorer::{self, PreparedEntry};
use crate::tokenize::tokenize;
use crate::types::{IndexMeta, KnowledgeEntry, KnowledgeIndexFile, KnowledgeMatch};

/// The in-memory, read-only knowledge index.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeIndex {
    meta: IndexMeta,
    entries: Vec<KnowledgeEntry>,
    prepared: Vec<PreparedEntry>,
}

impl KnowledgeIndex {
    pub fn new(meta: IndexMeta, entries: Vec<KnowledgeEntry>) -> Self {
        let prepared = entries.iter().map(PreparedEntry::new).collect();
        Self {
            meta,
            entries,
            prepared,
        }
    }

    /// Load the index from its JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Knowledge(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
            .map_err(|e| Error::Knowledge(format!("{}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: KnowledgeIndexFile = serde_json::from_str(raw)?;
        let index = Self::new(file.meta, file.entries);
        tracing::info!(
            entries = index.len(),
            version = %index.meta.version,
            "knowledge index loaded"
        );
        Ok(index)
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked matches for `query`, at most `limit`, zero scores excluded.
    pub fn search(&self, query: &str, limit: usize) -> Vec<KnowledgeMatch> {
        self.search_filtered(query, limit, 0.0)
    }

    /// Like [`search`](Self::search), but drops matches scoring below
    /// `minimum_score` before truncating to `limit`. Equal scores keep
    /// index order.
    pub fn search_filtered(
        &self,
        query: &str,
        limit: usize,
        minimum_score: f64,
    ) -> Vec<KnowledgeMatch> {
        let tokens = tokenize(query);
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .prepared
            .iter()
            .enumerate()
            .map(|(i, p)| (i, scorer::score(p, &tokens)))
            .filter(|&(_, s)| s > 0.0 && s >= minimum_score)
            .collect();

        // Stable: ties stay in index order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                KnowledgeMatch {
                    highlights: scorer::highlights(entry, &tokens),
                    entry: entry.clone(),
                    score,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "meta": {"version": "3", "scope": "Old Town"},
        "entries": [
            {"id": "fountain", "name": "Medici Fountain", "summary": "A baroque fountain in the garden.", "tags": ["water", "baroque"]},
            {"id": "tower", "name": "Clock Tower", "summary": "Medieval tower with a working clock.", "details": "The garden view from the top is best at dusk."},
            {"id": "cafe", "name": "Garden Cafe", "summary": "Coffee and pastries.", "tags": ["food"]}
        ]
    }"#;

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let index = KnowledgeIndex::load(f.path()).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.meta().scope.as_deref(), Some("Old Town"));
        assert!(index.get("tower").is_some());
    }

    #[test]
    fn missing_file_is_knowledge_error() {
        let err = KnowledgeIndex::load(Path::new("/nonexistent/knowledge.json")).unwrap_err();
        assert!(matches!(err, Error::Knowledge(_)));
    }

    #[test]
    fn ranks_name_hits_first() {
        let index = KnowledgeIndex::from_json(SAMPLE).unwrap();
        let results = index.search("garden", 10);
        let ids: Vec<&str> = results.iter().map(|m| m.entry.id.as_str()).collect();
        // cafe: name 5 + bonus 1; fountain: summary 3; tower: details 1
        assert_eq!(ids, vec!["cafe", "fountain", "tower"]);
    }

    #[test]
    fn minimum_score_applies_before_limit() {
        let index = KnowledgeIndex::from_json(SAMPLE).unwrap();
        let results = index.search_filtered("garden", 10, 2.0);
        assert_eq!(results.len(), 2);

        let results = index.search_filtered("garden", 1, 2.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, "cafe");
    }

    #[test]
    fn exhibit_named_after_a_common_verb_is_found() {
        let index = KnowledgeIndex::from_json(
            r#"{"entries": [{"id": "tell", "name": "William Tell", "summary": "Crossbow and apple, 1307."}]}"#,
        )
        .unwrap();
        let results = index.search("who was william tell", 5);
        assert_eq!(results.len(), 1);
        // "william" and "tell" each hit the name: (5 + 1) * 2
        assert!(results[0].score >= 10.0);
    }

    #[test]
    fn no_tokens_no_matches() {
        let index = KnowledgeIndex::from_json(SAMPLE).unwrap();
        assert!(index.search("what is this?", 5).is_empty());
        assert!(index.search("fountain", 0).is_empty());
    }
}
