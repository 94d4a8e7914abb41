pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::DocumentStore;
use bookshelf_kernel::{InitCtx, Module};
use utoipa::openapi::OpenApi;

use store::BookStore;

/// Books module: CRUD over the `books` collection
pub struct BooksModule {
    router: Router,
    openapi: OpenApi,
}

impl BooksModule {
    pub fn new(store: BookStore) -> Self {
        let (router, openapi) = routes::router(store).split_for_parts();
        Self { router, openapi }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        self.router.clone()
    }

    fn openapi(&self) -> Option<OpenApi> {
        Some(self.openapi.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module backed by `store`
pub fn create_module(store: Arc<dyn DocumentStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(BookStore::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_db::MemoryStore;

    #[test]
    fn openapi_lists_all_book_operations() {
        let module = create_module(Arc::new(MemoryStore::new()));
        let openapi = module.openapi().unwrap();

        let root = openapi.paths.paths.get("/").unwrap();
        assert!(root.get.is_some());
        assert!(root.post.is_some());

        let by_id = openapi.paths.paths.get("/{id}").unwrap();
        assert!(by_id.get.is_some());
        assert!(by_id.put.is_some());
        assert!(by_id.delete.is_some());

        let schemas = &openapi.components.as_ref().unwrap().schemas;
        for name in ["Book", "BookPayload", "ErrorBody", "UpdateResponse"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
