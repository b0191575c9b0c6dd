//! Loading of the generated site search manifest: `{id, title, description,
//! category, url, tags}` records as `.json` or `.jsonl`.

use crate::{DocId, Document};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct ManifestEntry {
    pub id: DocId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub url: Option<String>,
    pub tags: Vec<String>,
    /// Tags joined by spaces, exposed as the `tags` field.
    #[serde(skip_serializing)]
    tags_text: String,
}

#[derive(Deserialize)]
struct RawEntry {
    id: DocId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<RawEntry> for ManifestEntry {
    fn from(raw: RawEntry) -> Self {
        let tags_text = raw.tags.join(" ");
        Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            category: raw.category,
            url: raw.url,
            tags: raw.tags,
            tags_text,
        }
    }
}

impl ManifestEntry {
    pub fn new(id: impl Into<DocId>, title: &str, description: &str, category: &str) -> Self {
        RawEntry {
            id: id.into(),
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            url: None,
            tags: Vec::new(),
        }
        .into()
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self.tags_text = self.tags.join(" ");
        self
    }
}

impl Document for ManifestEntry {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(self.title.as_str()),
            "description" => Some(self.description.as_str()),
            "category" => Some(self.category.as_str()),
            "url" => self.url.as_deref(),
            "tags" => Some(self.tags_text.as_str()),
            _ => None,
        }
    }

    fn string_fields(&self) -> Vec<(&str, &str)> {
        ["title", "description", "category", "url", "tags"]
            .into_iter()
            .filter_map(|name| self.field(name).map(|text| (name, text)))
            .collect()
    }
}

/// Load one manifest file. `.jsonl` is read line by line; anything else is parsed
/// as a JSON array of entries or a single entry.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let f = File::open(path).with_context(|| format!("opening manifest {}", path.display()))?;
    let reader = BufReader::new(f);
    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut entries = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let entry: ManifestEntry = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
            entries.push(entry);
        }
        return Ok(entries);
    }
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    let entries = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ManifestEntry>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(entries)
}

/// Load a manifest file, or every `.json`/`.jsonl` file below a directory in path order.
pub fn load_manifest_dir(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut entries = Vec::new();
    for file in files {
        let loaded = load_manifest(&file)?;
        tracing::debug!(file = %file.display(), count = loaded.len(), "loaded manifest");
        entries.extend(loaded);
    }
    Ok(entries)
}
