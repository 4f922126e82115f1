//! # ragctx CLI
//!
//! Command-line interface for ragctx, a document chunking and context
//! retrieval engine for retrieval-augmented generation.
//!
//! ## Commands
//!
//! - `ragctx chunk <FILE>` - Chunk one file and print the chunks
//! - `ragctx query <QUERY> <FILES>...` - Print context relevant to a query
//! - `ragctx stats <FILES>...` - Show chunking statistics
//! - `ragctx config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Chunk a CSV file in row batches
//! ragctx chunk data/sales.csv
//!
//! # Retrieve context from a set of documents
//! ragctx query "quarterly revenue" reports/*.md --limit 2
//!
//! # Get JSON output
//! ragctx stats reports/*.md --format json
//! ```
//!
//! Form feed characters in input files are treated as page breaks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragctx_core::{ChunkingStatistics, DocumentStore, FormatHints, StoreStats};
use ragctx_index::{ChunkManager, DocumentIngestor, NewDocument};
use ragctx_query::ContextRetriever;
use ragctx_store::MemoryStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "ragctx")]
#[command(about = "Document chunking and context retrieval for RAG pipelines")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/ragctx/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    fn as_export(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a file and print the chunks
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// File type (defaults to the file extension)
        #[arg(short = 't', long)]
        file_type: Option<String>,
    },

    /// Print context relevant to a query
    Query {
        /// Query string
        query: String,

        /// Files to search
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum number of documents in the context
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Show chunking statistics
    Stats {
        /// Files to chunk
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for query results.
#[derive(Serialize)]
struct QueryOutput {
    query: String,
    files: usize,
    context: Option<String>,
}

/// Output structure for stats.
#[derive(Serialize)]
struct StatsOutput {
    chunking: ChunkingStatistics,
    store: StoreStats,
}

/// A file read from disk, ready for chunking.
struct InputFile {
    title: String,
    file_type: Option<String>,
    content: String,
    hints: FormatHints,
}

impl InputFile {
    fn read(path: &Path, file_type: Option<String>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (content, page_breaks) = split_pages(&raw);
        let hints = page_breaks.map(FormatHints::with_page_breaks).unwrap_or_default();

        let title = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
        let file_type = file_type.or_else(|| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
        });

        Ok(Self {
            title,
            file_type,
            content,
            hints,
        })
    }

    fn into_document(self) -> NewDocument {
        let mut document = NewDocument::new(self.title, self.content).with_hints(self.hints);
        if let Some(file_type) = self.file_type {
            document = document.with_file_type(file_type);
        }
        document
    }
}

/// Replace form feeds with line breaks, returning the line indices at which
/// each new page starts. `None` when the text has no form feeds.
fn split_pages(raw: &str) -> (String, Option<Vec<usize>>) {
    if !raw.contains('\u{c}') {
        return (raw.to_string(), None);
    }

    let mut text = String::with_capacity(raw.len());
    let mut breaks = Vec::new();
    for page in raw.split('\u{c}') {
        if page.trim().is_empty() {
            continue;
        }
        if !text.is_empty() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            breaks.push(text.split_inclusive('\n').count());
        }
        text.push_str(page);
    }

    (text, Some(breaks))
}

/// Ingest every file into a fresh memory store.
async fn ingest_files(config: &Config, files: &[PathBuf]) -> Result<DocumentIngestor> {
    let manager = Arc::new(ChunkManager::new(config.chunking.clone())?);
    let store = Arc::new(MemoryStore::new());
    store.init().await.context("Failed to initialize store")?;
    let ingestor = DocumentIngestor::new(manager, store as Arc<dyn DocumentStore>);

    for path in files {
        let input = InputFile::read(path, None)?;
        let report = ingestor
            .ingest(input.into_document())
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        info!(
            "Ingested {} as {} ({} chunks)",
            path.display(),
            report.document_id,
            report.chunk_count
        );
    }

    Ok(ingestor)
}

/// Registry statistics alongside what the store actually holds.
async fn collect_stats(ingestor: &DocumentIngestor) -> Result<StatsOutput> {
    let chunking = ingestor.manager().get_chunking_statistics();
    let store = ingestor
        .store()
        .stats()
        .await
        .context("Failed to read store statistics")?;
    Ok(StatsOutput { chunking, store })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config from file or CLI-specified path
    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Chunk { file, file_type } => {
            let input = InputFile::read(&file, file_type)?;
            let document_id = file
                .file_stem()
                .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().to_string());

            let manager = ChunkManager::new(config.chunking.clone())?;
            let chunks = manager
                .chunk_document(
                    &input.content,
                    &document_id,
                    input.file_type.as_deref(),
                    &input.hints,
                )
                .with_context(|| format!("Failed to chunk {}", file.display()))?;
            info!("{}: {} chunks", file.display(), chunks.len());

            let output = manager
                .export_chunks(&document_id, cli.format.as_export())
                .context("Failed to export chunks")?;
            println!("{output}");
        }

        Commands::Query {
            query,
            files,
            limit,
        } => {
            let ingestor = ingest_files(&config, &files).await?;
            let retriever = ContextRetriever::new(
                ingestor.manager().clone(),
                ingestor.store().clone(),
                config.retrieval.clone(),
            );
            let context = retriever.get_relevant_context(&query, limit).await;

            match cli.format {
                OutputFormat::Json => {
                    let output = QueryOutput {
                        query: query.clone(),
                        files: files.len(),
                        context,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => match context {
                    Some(context) => println!("{context}"),
                    None => println!("No relevant context found for {query:?}."),
                },
            }
        }

        Commands::Stats { files } => {
            let ingestor = ingest_files(&config, &files).await?;
            let output = collect_stats(&ingestor).await?;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    let stats = &output.chunking;
                    println!("Chunking Statistics");
                    println!("  Documents:  {}", stats.total_documents);
                    println!("  Chunks:     {}", stats.total_chunks);
                    println!("  Words:      {}", stats.total_words);
                    println!("  Avg size:   {:.1} chars", stats.average_chunk_size);
                    println!(
                        "  Size:       min {:.0} / median {:.0} / max {:.0}",
                        stats.size_stats.min, stats.size_stats.median, stats.size_stats.max
                    );
                    println!("  Confidence: {:.3} avg", stats.average_confidence);
                    println!(
                        "  Quality:    {} high, {} medium, {} low",
                        stats.quality.high, stats.quality.medium, stats.quality.low
                    );
                    for (chunk_type, count) in &stats.chunk_types {
                        println!("  {:<11} {}", chunk_type.as_str(), count);
                    }
                    println!(
                        "  Stored:     {} documents, {} chunk rows",
                        output.store.total_documents, output.store.total_chunks
                    );
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                print!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_without_form_feed() {
        let (text, breaks) = split_pages("one\ntwo\n");
        assert_eq!(text, "one\ntwo\n");
        assert!(breaks.is_none());
    }

    #[test]
    fn test_split_pages_marks_page_starts() {
        let (text, breaks) = split_pages("page one\nstill one\n\u{c}page two\u{c}page three");
        assert_eq!(text, "page one\nstill one\npage two\npage three");
        assert_eq!(breaks, Some(vec![2, 3]));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "page two");
        assert_eq!(lines[3], "page three");
    }

    #[test]
    fn test_split_pages_skips_empty_pages() {
        let (text, breaks) = split_pages("\u{c}first\u{c}\u{c}second\u{c}");
        assert_eq!(text, "first\nsecond");
        assert_eq!(breaks, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_ingest_files_and_collect_stats() {
        let dir = tempfile::tempdir().unwrap();
        let guide = dir.path().join("guide.md");
        let note = dir.path().join("note.txt");
        let paragraph = "Chunking splits long documents into readable pieces. \
            Each piece keeps enough context to stand on its own.";
        std::fs::write(&guide, vec![paragraph; 8].join("\n\n")).unwrap();
        std::fs::write(&note, "Too short.").unwrap();

        let ingestor = ingest_files(&Config::default(), &[guide, note]).await.unwrap();
        let output = collect_stats(&ingestor).await.unwrap();

        assert_eq!(output.chunking.total_documents, 2);
        assert_eq!(output.store.total_documents, 2);
        assert_eq!(output.store.total_chunks as usize, output.chunking.total_chunks);
        // The short note is stored as a single fallback chunk
        assert!(output.chunking.total_chunks >= 2);
    }

    #[tokio::test]
    async fn test_ingest_files_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");
        let err = ingest_files(&Config::default(), &[missing]).await.err().unwrap();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_output_format_export_names() {
        assert_eq!(OutputFormat::Text.as_export(), "text");
        assert_eq!(OutputFormat::Json.as_export(), "json");
    }
}
