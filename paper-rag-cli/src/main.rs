//! `paper-rag` binary entry point.
//!
//! Lists Zotero collections and PDF papers, and answers questions about
//! selected papers either once (`ask`) or in an interactive loop (`chat`).

mod cli;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paper_rag::{
    Answer, AskConfig, EmbeddingCache, LibraryClient, MissingDocumentPolicy, OpenAIChatClient,
    OpenAIEmbeddingProvider, PaperQa, PaperRecord, ParagraphChunker, PdfLoader, RagConfig,
    RagError, ZoteroClient, select_documents,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::cli::{Cli, Command, LibraryArgs, QaArgs};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    match cli.command {
        Command::Collections { library } => list_collections(&library).await,
        Command::Papers { library, collection, json } => {
            list_papers(&library, collection.as_deref(), json).await
        }
        Command::Ask { library, qa, query, json } => ask(&library, &qa, query, json).await,
        Command::Chat { library, qa } => chat(&library, &qa).await,
    }
}

fn zotero(library: &LibraryArgs) -> Result<ZoteroClient> {
    ZoteroClient::new(library.user_id.clone(), library.api_key.clone())
        .context("Failed to create Zotero client")
}

fn build_pipeline(qa: &QaArgs, cache: Option<Arc<EmbeddingCache>>) -> Result<PaperQa> {
    let config = RagConfig::builder()
        .top_n(qa.top_n)
        .missing_documents(qa.missing_documents())
        .build()?;

    let chunker = if qa.keep_blank_paragraphs {
        ParagraphChunker::keep_blank()
    } else {
        ParagraphChunker::new()
    };

    let mut embedder = OpenAIEmbeddingProvider::new(qa.openai_api_key.clone())?;
    if let Some(model) = &qa.embedding_model {
        embedder = embedder.with_model(model.clone());
    }

    let mut builder = PaperQa::builder()
        .config(config)
        .loader(Arc::new(PdfLoader::new().with_page_policy(qa.page_policy())))
        .chunker(Arc::new(chunker))
        .embedding_provider(Arc::new(embedder))
        .generation_client(Arc::new(OpenAIChatClient::new(qa.openai_api_key.clone())?));
    if let Some(cache) = cache {
        builder = builder.embedding_cache(cache);
    }
    Ok(builder.build()?)
}

async fn list_collections(library: &LibraryArgs) -> Result<()> {
    let collections = zotero(library)?
        .list_collections()
        .await
        .context("Failed to list collections")?;

    if collections.is_empty() {
        println!("No collections found.");
    }
    for collection in collections {
        println!("{}\t{} ({} items)", collection.key, collection.name, collection.item_count);
    }
    Ok(())
}

async fn list_papers(library: &LibraryArgs, collection: Option<&str>, json: bool) -> Result<()> {
    let papers = zotero(library)?
        .list_papers(collection)
        .await
        .context("Failed to list papers")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&papers)?);
        return Ok(());
    }
    if papers.is_empty() {
        println!("No PDF papers found.");
    }
    for paper in papers {
        let publication =
            if paper.publication.is_empty() { "-" } else { paper.publication.as_str() };
        println!("{}\t{}\t{}", paper.document_id, paper.title, publication);
    }
    Ok(())
}

async fn ask(library: &LibraryArgs, qa: &QaArgs, query: String, json: bool) -> Result<()> {
    let pipeline = build_pipeline(qa, None)?;
    let config = AskConfig {
        library_user_id: library.user_id.clone(),
        library_key: library.api_key.clone(),
        storage_root: qa.storage.clone(),
        selected_document_ids: qa.documents.clone(),
        query,
        model_params: qa.model_params(),
    };

    let answer = paper_rag::ask(&config, &pipeline).await.context("Failed to answer the question")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

/// Resolve the selected keys once for the whole chat session.
async fn resolve_documents(library: &LibraryArgs, qa: &QaArgs) -> Result<Vec<PaperRecord>> {
    let papers = zotero(library)?.list_papers(None).await.context("Failed to list papers")?;
    let (documents, unknown) = select_documents(&papers, &qa.documents);

    if !unknown.is_empty() {
        if qa.missing_documents() == MissingDocumentPolicy::Fail {
            return Err(RagError::NotFound {
                document_id: unknown.join(", "),
                location: "the library".to_string(),
            }
            .into());
        }
        warn!(unknown = ?unknown, "selected ids not in library, skipping");
    }
    if documents.is_empty() {
        anyhow::bail!("None of the selected documents are in the library");
    }
    Ok(documents)
}

async fn chat(library: &LibraryArgs, qa: &QaArgs) -> Result<()> {
    let documents = resolve_documents(library, qa).await?;
    let cache = Arc::new(EmbeddingCache::new());
    let pipeline = build_pipeline(qa, Some(cache.clone()))?;
    let params = qa.model_params();

    println!("Asking about:");
    for document in &documents {
        println!("  {} ({})", document.title, document.document_id);
    }
    println!("Type a question, /sources to show the last sources, /quit to exit.");
    println!();

    let mut rl = DefaultEditor::new().context("Failed to create readline editor")?;
    let mut last: Option<Answer> = None;

    loop {
        let line = match rl.readline("Question> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        match line {
            "/quit" | "/exit" => break,
            "/sources" => {
                match &last {
                    Some(answer) => print_sources(answer),
                    None => println!("No question asked yet."),
                }
                continue;
            }
            _ => {}
        }

        match pipeline.answer(&qa.storage, &documents, line, &params).await {
            Ok(answer) => {
                println!("\n{}\n", answer.answer);
                for skipped in &answer.skipped_documents {
                    eprintln!("Skipped {skipped}: no PDF found");
                }
                last = Some(answer);
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    let cached_chunks = cache.len().await;
    info!(cached_chunks, "chat session ended");
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);
    println!();
    print_sources(answer);
    for skipped in &answer.skipped_documents {
        eprintln!("Skipped {skipped}: no PDF found");
    }
}

fn print_sources(answer: &Answer) {
    println!("Sources:");
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "  [{}] {}, p. {} (similarity {:.3})",
            i + 1,
            source.chunk.title,
            source.chunk.page,
            source.similarity
        );
    }
}
