//! Core data models.
//!
//! [`Record`] is the single persisted entity. The `Api*` types mirror the
//! upstream portfolio API responses and only carry the fields ingestion reads.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A stored project record.
///
/// `Record::default()` is the zero-valued record returned by `POST /q` when a
/// query matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub source_url: String,
}

/// A record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub title: String,
    pub description: String,
    pub filename: String,
    pub source_url: String,
}

impl NewRecord {
    /// Builds a record whose filename is derived from `source_url`.
    pub fn new(title: String, description: String, source_url: String) -> Self {
        let filename = crate::assets::filename_from_url(&source_url).to_string();
        Self {
            title,
            description,
            filename,
            source_url,
        }
    }

    pub fn with_id(self, id: i64) -> Record {
        Record {
            id,
            title: self.title,
            description: self.description,
            filename: self.filename,
            source_url: self.source_url,
        }
    }
}

/// Equality filter over record fields.
///
/// Absent and empty fields impose no constraint; the present ones are
/// combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "src")]
    pub source_url: Option<String>,
}

impl RecordQuery {
    /// Non-empty predicates as `(column, value)` pairs, in column order.
    pub fn predicates(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("filename", &self.filename),
            ("source_url", &self.source_url),
        ]
        .into_iter()
        .filter_map(|(column, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((column, v)),
            _ => None,
        })
        .collect()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates().into_iter().all(|(column, value)| {
            let field = match column {
                "title" => &record.title,
                "description" => &record.description,
                "filename" => &record.filename,
                _ => &record.source_url,
            };
            field == value
        })
    }
}

/// Treats an explicit `null` like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `covers` is a size→URL object, but projects without covers send `[]`
/// (or `null`) instead of `{}`.
fn covers_map<'de, D>(deserializer: D) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Covers {
        Map(HashMap<String, serde_json::Value>),
        Seq(Vec<serde_json::Value>),
    }

    Ok(match Option::<Covers>::deserialize(deserializer)? {
        Some(Covers::Map(map)) => map,
        Some(Covers::Seq(_)) | None => HashMap::new(),
    })
}

/// One page of `GET /creativestofollow`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCreatorsPage {
    #[serde(
        default,
        rename = "creatives_to_follow",
        deserialize_with = "null_as_default"
    )]
    pub creators: Vec<ApiCreator>,
}

/// A creator entry. `username` is empty when upstream omitted it; such
/// entries cannot be looked up and are skipped by ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreator {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
}

/// `GET /users/{username}/projects`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUserProjects {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<ApiProjectRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProjectRef {
    pub id: i64,
}

/// `GET /projects/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProjectEnvelope {
    pub project: ApiProject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProject {
    #[serde(default, rename = "name", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Cover image URLs keyed by size (`"original"`, `"404"`, ...).
    #[serde(default, deserialize_with = "covers_map")]
    pub covers: HashMap<String, serde_json::Value>,
}

impl ApiProject {
    /// URL of the full-size cover image, if the project has one.
    pub fn original_cover(&self) -> Option<&str> {
        self.covers.get("original").and_then(|v| v.as_str())
    }
}
