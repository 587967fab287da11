//! Triage Assistant - terminal front end
//!
//! Reads configuration from the environment, wires the services into the
//! selected workflow, and runs one session against stdin/stdout. Logs go to
//! stderr as JSON so they never interleave with the conversation.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_assistant::classifier::Classifier;
use triage_assistant::config::{RetrievalSettings, TriageConfig};
use triage_assistant::console::{handle_interrupts, Dialogue, TerminalConsole};
use triage_assistant::llm::{LlmService, LoggingService, OpenAIService, ResilientService};
use triage_assistant::retrieval::{
    EmbeddingRetriever, KnowledgeBase, LexicalRetriever, LoggingRetriever, OpenAIEmbedder,
    Retriever,
};
use triage_assistant::session::{run_session_with, Repeat, SessionOutcome};
use triage_assistant::stages::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage_assistant=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = TriageConfig::from_env();
    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        workflow = ?config.workflow,
        retrieval = config.retrieval.enabled,
        "Configuration loaded"
    );

    // Completion backend: timeout and retry inside, logging outside
    let openai: Arc<dyn LlmService> = Arc::new(OpenAIService::new(
        &config.llm.base_url,
        config.llm.api_key.clone(),
        config.llm.model.clone(),
    )?);
    let resilient: Arc<dyn LlmService> =
        Arc::new(ResilientService::new(openai, config.llm.retry_policy()));
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(resilient));

    let mut services = Services::new(llm, Arc::new(Classifier::new()))
        .with_options(config.stage_options());
    if config.retrieval.enabled {
        services = services.with_retriever(build_retriever(&config)?);
    }

    let graph = config.workflow.build(&services)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(handle_interrupts(tokio::signal::ctrl_c, interrupt, || {
        std::process::exit(130)
    }));

    let mut dialogue = Dialogue::with_cancellation(Box::new(TerminalConsole::new()), cancel);
    let repeat = config.workflow.repeat();
    let report = run_session_with(&graph, &mut dialogue, repeat).await?;

    // The check-in says its own goodbye
    if report.outcome == SessionOutcome::EndedByUser && repeat == Repeat::Once {
        println!("\nEnding chat. Goodbye!");
    }
    Ok(())
}

fn build_retriever(
    config: &TriageConfig,
) -> Result<Arc<dyn Retriever>, Box<dyn std::error::Error>> {
    let RetrievalSettings {
        knowledge_base,
        embedding_model,
        timeout,
        ..
    } = &config.retrieval;

    let kb = Arc::new(match knowledge_base {
        Some(path) => KnowledgeBase::from_file(path)?,
        None => KnowledgeBase::default(),
    });

    let inner: Arc<dyn Retriever> = match embedding_model {
        Some(model) => {
            let embedder = OpenAIEmbedder::new(
                &config.llm.base_url,
                config.llm.api_key.clone(),
                model.clone(),
                *timeout,
            )?;
            Arc::new(EmbeddingRetriever::new(kb, Arc::new(embedder)))
        }
        None => Arc::new(LexicalRetriever::new(kb)),
    };
    tracing::info!(retriever = inner.name(), "Retrieval enabled");

    Ok(Arc::new(LoggingRetriever::new(inner)))
}
