use anyhow::Result;
use clap::{Parser, Subcommand};
use palette_core::{
    extract_snippet, fuzzy_search_multi_key, load_manifest_dir, suggest_queries, FuzzySearchOptions, IndexConfig,
    ManifestEntry, Markers, SearchIndex, SearchOptions, SnippetOptions,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Query a site search manifest with the palette search index", long_about = None)]
struct Cli {
    /// Index configuration JSON; defaults to title/description/category/tags with a boosted title
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ranked full-text search
    Search {
        /// Manifest file (.json/.jsonl) or directory of manifests
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
    },
    /// Word completions for a partial query
    Suggest {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        prefix: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Fuzzy match entry titles and categories
    Fuzzy {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
    },
    /// Document, term and field-length statistics
    Stats {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct SearchLine<'a> {
    doc_id: String,
    score: f64,
    title: &'a str,
    url: Option<&'a str>,
    snippet: String,
}

#[derive(Serialize)]
struct FuzzyLine<'a> {
    doc_id: String,
    score: f64,
    key: Option<String>,
    highlighted: String,
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct Stats {
    documents: usize,
    terms: usize,
    average_field_lengths: HashMap<String, f64>,
}

fn default_config() -> IndexConfig {
    IndexConfig {
        fields: Some(["title", "description", "category", "tags"].map(String::from).to_vec()),
        field_weights: HashMap::from([("title".to_string(), 2.0), ("tags".to_string(), 1.5)]),
        ..IndexConfig::default()
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => IndexConfig::from_json_file(path)?,
        None => default_config(),
    };

    match cli.command {
        Commands::Search { input, query, limit, threshold } => {
            let (_, index) = build_index(&config, &input)?;
            let opts = SnippetOptions { markers: Markers::new("<em>", "</em>"), ..SnippetOptions::default() };
            let terms: Vec<&str> = query.split_whitespace().collect();
            let lines: Vec<SearchLine> = index
                .search(&query, SearchOptions { limit, threshold })
                .into_iter()
                .map(|hit| SearchLine {
                    doc_id: hit.doc_id.to_string(),
                    score: hit.score,
                    title: &hit.doc.title,
                    url: hit.doc.url.as_deref(),
                    snippet: extract_snippet(&hit.doc.description, &terms, &opts),
                })
                .collect();
            tracing::info!(query = query.as_str(), hits = lines.len(), "search complete");
            print_json(&lines)
        }
        Commands::Suggest { input, prefix, limit } => {
            let (_, index) = build_index(&config, &input)?;
            print_json(&suggest_queries(&prefix, &index, limit))
        }
        Commands::Fuzzy { input, query, limit, threshold } => {
            let (entries, _) = build_index(&config, &input)?;
            let mut opts = FuzzySearchOptions::with_threshold(threshold);
            opts.limit = Some(limit);
            let lines: Vec<FuzzyLine> = fuzzy_search_multi_key(&query, &entries, &[("title", 1.0), ("category", 0.5)], &opts)
                .into_iter()
                .map(|m| FuzzyLine {
                    doc_id: m.original.id.to_string(),
                    score: m.result.score,
                    key: m.key,
                    highlighted: m.result.highlighted,
                    url: m.original.url.as_deref(),
                })
                .collect();
            print_json(&lines)
        }
        Commands::Stats { input } => {
            let (_, index) = build_index(&config, &input)?;
            let fields = config.fields.clone().unwrap_or_default();
            let stats = Stats {
                documents: index.len(),
                terms: index.term_count(),
                average_field_lengths: fields
                    .into_iter()
                    .map(|f| {
                        let avg = index.average_field_length(&f);
                        (f, avg)
                    })
                    .collect(),
            };
            print_json(&stats)
        }
    }
}

fn build_index(config: &IndexConfig, input: &Path) -> Result<(Vec<ManifestEntry>, SearchIndex<ManifestEntry>)> {
    let entries = load_manifest_dir(input)?;
    let mut index: SearchIndex<ManifestEntry> = config.build();
    index.add_all(entries.iter().cloned().map(|e| (e.id.clone(), e)));
    tracing::info!(num_docs = index.len(), num_terms = index.term_count(), "indexed manifest");
    Ok((entries, index))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
