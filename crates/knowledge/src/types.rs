use serde::{Deserialize, Serialize};

/// One curated fact about the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Where an entry lives: either a free-text place ("East wing, room 4")
/// or coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Coordinates {
        lat: f64,
        lng: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Named(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// On-disk shape of the knowledge index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeIndexFile {
    #[serde(default)]
    pub meta: IndexMeta,
    pub entries: Vec<KnowledgeEntry>,
}

/// A scored entry for one query. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeMatch {
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
    pub score: f64,
    pub highlights: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_accepts_both_shapes() {
        let named: Location = serde_json::from_str(r#""North courtyard""#).unwrap();
        assert_eq!(named, Location::Named("North courtyard".into()));

        let coords: Location = serde_json::from_str(r#"{"lat": 48.86, "lng": 2.33}"#).unwrap();
        assert!(matches!(coords, Location::Coordinates { label: None, .. }));
    }

    #[test]
    fn minimal_entry_parses() {
        let e: KnowledgeEntry =
            serde_json::from_str(r#"{"id": "x", "name": "Fountain"}"#).unwrap();
        assert!(e.tags.is_empty());
        assert!(e.location.is_none());
    }

    #[test]
    fn match_serializes_flat() {
        let m = KnowledgeMatch {
            entry: serde_json::from_str(r#"{"id": "x", "name": "Fountain"}"#).unwrap(),
            score: 6.0,
            highlights: vec![],
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["id"], "x");
        assert_eq!(v["score"], 6.0);
    }
}
