//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use paper_rag::config::{
    DEFAULT_CHAT_MODEL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_N,
};
use paper_rag::{MissingDocumentPolicy, ModelParams, PagePolicy};

/// Ask questions about the PDF papers in a Zotero library
#[derive(Parser, Debug)]
#[command(
    name = "paper-rag",
    version,
    about = "Ask questions about the PDF papers in a Zotero library",
    long_about = "Answers questions from the text of selected Zotero PDF attachments. \
                  The most relevant paragraphs are retrieved by embedding similarity \
                  and passed to a chat model as grounding.

EXAMPLES:
  List the PDF papers in a collection:
    paper-rag papers --collection ABCD1234

  Ask one question about two papers:
    paper-rag ask --document KEY1 --document KEY2 --query \"What dataset is used?\"

  Ask several questions, reusing embeddings:
    paper-rag chat --document KEY1"
)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the collections in the library
    Collections {
        #[command(flatten)]
        library: LibraryArgs,
    },

    /// List the PDF papers in the library or one collection
    Papers {
        #[command(flatten)]
        library: LibraryArgs,

        /// Only list papers in this collection
        #[arg(long, value_name = "KEY")]
        collection: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Answer one question
    Ask {
        #[command(flatten)]
        library: LibraryArgs,

        #[command(flatten)]
        qa: QaArgs,

        /// The question
        #[arg(long, short = 'q', value_name = "TEXT")]
        query: String,

        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask questions interactively about the same papers
    Chat {
        #[command(flatten)]
        library: LibraryArgs,

        #[command(flatten)]
        qa: QaArgs,
    },
}

/// Zotero credentials.
#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    /// Zotero user id
    #[arg(long, env = "ZOTERO_USER_ID", value_name = "ID")]
    pub user_id: String,

    /// Zotero API key
    #[arg(long, env = "ZOTERO_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: String,
}

/// Options shared by `ask` and `chat`.
#[derive(Args, Debug, Clone)]
pub struct QaArgs {
    /// Attachment key of a paper to query (repeatable)
    #[arg(long = "document", short = 'd', value_name = "KEY", required = true)]
    pub documents: Vec<String>,

    /// Zotero storage directory
    #[arg(long, env = "ZOTERO_STORAGE", value_name = "DIR")]
    pub storage: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Number of paragraphs passed to the chat model
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Chat model
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    /// Embedding model
    #[arg(long, value_name = "MODEL")]
    pub embedding_model: Option<String>,

    /// Sampling temperature
    #[arg(long, value_name = "T", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum answer length in tokens
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    pub max_tokens: u32,

    /// Keep whitespace-only paragraphs as chunks
    #[arg(long)]
    pub keep_blank_paragraphs: bool,

    /// Skip selected papers that have no PDF instead of failing
    #[arg(long)]
    pub skip_missing: bool,

    /// Skip pages whose text cannot be extracted instead of failing
    #[arg(long)]
    pub skip_unreadable_pages: bool,
}

impl QaArgs {
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
        }
    }

    pub fn missing_documents(&self) -> MissingDocumentPolicy {
        if self.skip_missing { MissingDocumentPolicy::Skip } else { MissingDocumentPolicy::Fail }
    }

    pub fn page_policy(&self) -> PagePolicy {
        if self.skip_unreadable_pages { PagePolicy::SkipUnreadable } else { PagePolicy::Strict }
    }
}
