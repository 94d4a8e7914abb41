//! Bookshelf application library
//!
//! Wires the books module into the kernel registry and runs the HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::DocumentStore;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use utoipa::openapi::OpenApi;

/// Build a registry with every application module bound to `store`
pub fn build_registry(store: Arc<dyn DocumentStore>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store)?;
    Ok(registry)
}

/// Merged OpenAPI document as the server would publish it
pub fn openapi_document(settings: &Settings) -> anyhow::Result<OpenApi> {
    let registry = build_registry(Arc::new(bookshelf_db::MemoryStore::new()))?;
    Ok(bookshelf_http::router::collect_openapi(
        &registry,
        &settings.server,
    ))
}

/// Open the store, run module lifecycle hooks, and serve until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = bookshelf_db::open(&settings.database)?;
    let registry = build_registry(store)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry
        .stop_all()
        .await
        .with_context(|| "failed to stop modules")?;

    served
}
