//! Storefront support CLI.
//!
//! Usage:
//!   storefront-support recent list
//!   storefront-support recent add '<item json>'
//!   storefront-support recent clear
//!   storefront-support translate <text> [--from <code>] [--context <text>]
//!   storefront-support languages
//!
//! Optional environment variables:
//! - STORE_BACKEND (memory, file or sqlite; defaults to file)
//! - STORE_PATH (defaults to data/store)
//!
//! `translate` also needs TRANSLATE_FUNCTIONS_URL and TRANSLATE_API_KEY.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::sync::Arc;
use storefront_support::{
    config::{Config, StoreBackend},
    i18n::LanguageRegistry,
    remote::HttpTranslationService,
    store::{FileStore, MemoryStore, SqliteStore},
    translation::TranslationRequest,
    CatalogItem, DurableStore, PersonalizationCache, TranslationOrchestrator, TranslationOutcome,
};
use tracing::{info, warn};

fn print_usage() {
    eprintln!(
        r#"
Storefront support tool

USAGE:
    storefront-support <COMMAND>

COMMANDS:
    recent list                 Print the recently viewed items, newest first
    recent add <json>           Record a view of a catalog item (needs an "id" field)
    recent clear                Forget all recently viewed items
    translate <text>            Translate into every other storefront language
        --from <code>           Source language (default: sv)
        --context <text>        Hint about where the text appears
    languages                   List the storefront languages
    help                        Show this help message
"#
    );
}

/// Open the configured store. A persistent backend that cannot be opened
/// falls back to a session-local `MemoryStore`.
fn open_store(config: &Config) -> Arc<dyn DurableStore> {
    match open_persistent_store(config) {
        Ok(store) => store,
        Err(e) => {
            warn!(
                error = %format!("{:#}", e),
                backend = ?config.store_backend,
                "store unavailable, recently viewed items will not outlive this process"
            );
            Arc::new(MemoryStore::new())
        }
    }
}

fn open_persistent_store(config: &Config) -> Result<Arc<dyn DurableStore>> {
    let store: Arc<dyn DurableStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => {
            let store = FileStore::open(&config.store_path).with_context(|| {
                format!("Failed to open store at {}", config.store_path.display())
            })?;
            info!(path = %store.root().display(), "file store ready");
            Arc::new(store)
        }
        StoreBackend::Sqlite => {
            if let Some(parent) = config.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let store = SqliteStore::open(&config.store_path).with_context(|| {
                format!("Failed to open database at {}", config.store_path.display())
            })?;
            info!(path = %config.store_path.display(), "sqlite store ready");
            Arc::new(store)
        }
    };

    Ok(store)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn recent_command(config: &Config, args: &[String]) -> Result<()> {
    let cache: PersonalizationCache<CatalogItem> = PersonalizationCache::open(open_store(config));

    match args.first().map(String::as_str) {
        Some("list") | None => print_json(&*cache.list()),
        Some("add") => {
            let raw = args.get(1).context("recent add needs an item as JSON")?;
            let item: CatalogItem =
                serde_json::from_str(raw).context("Item must be a JSON object with an \"id\" field")?;
            info!(id = %item.id, "recording view");
            cache.add(item);
            print_json(&*cache.list())
        }
        Some("clear") => {
            cache.clear();
            info!("recently viewed items cleared");
            Ok(())
        }
        Some(other) => bail!("Unknown recent command: {}", other),
    }
}

/// Split `translate` arguments into a request. The first free argument is the text.
fn parse_translate_args(args: &[String]) -> Result<TranslationRequest> {
    let mut text = None;
    let mut source = None;
    let mut context = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--from" => source = Some(iter.next().context("--from needs a language code")?),
            "--context" => context = Some(iter.next().context("--context needs a value")?),
            _ if text.is_none() => text = Some(arg),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    let mut request = TranslationRequest::new(text.context("translate needs a text")?.as_str());
    if let Some(source) = source {
        request = request.from_language(source.as_str());
    }
    if let Some(context) = context {
        request = request.with_context(context.as_str());
    }
    Ok(request)
}

async fn translate_command(config: &Config, args: &[String]) -> Result<()> {
    let request = parse_translate_args(args)?;

    if !config.translation_enabled() {
        bail!("translate needs TRANSLATE_FUNCTIONS_URL and TRANSLATE_API_KEY to be set");
    }
    if !LanguageRegistry::get().is_supported(&request.source_language) {
        warn!(
            source = %request.source_language,
            "source is not a storefront language, translating into all of them"
        );
    }

    let service = HttpTranslationService::from_config(config)?;
    let orchestrator = TranslationOrchestrator::new(Arc::new(service))
        .with_function_name(config.translate_function_name.clone());

    match orchestrator.translate_outcome(&request).await {
        TranslationOutcome::Translated(result) => print_json(&result),
        TranslationOutcome::Skipped => bail!("Nothing to translate: text is blank"),
        TranslationOutcome::Failed(failure) => bail!("Translation failed: {}", failure),
    }
}

fn languages_command() -> Result<()> {
    print_json(&LanguageRegistry::get().list_all())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("storefront_support=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "languages" => languages_command(),
        "recent" => recent_command(&Config::from_env()?, rest),
        "translate" => translate_command(&Config::from_env()?, rest).await,
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}
