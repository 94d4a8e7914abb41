//! Router builder for the bookshelf HTTP server

use axum::{
    http::{HeaderValue, Request},
    routing::get,
    Json, Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use utoipa::openapi::OpenApi;
use utoipa::OpenApi as _;
use uuid::Uuid;

use bookshelf_kernel::{settings::ServerSettings, ModuleRegistry};

/// Builder for constructing the main HTTP router
///
/// Layers wrap only the routes added before them, so add routes first.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `mount_path`
    pub fn mount_module(mut self, mount_path: &str, module_router: Router) -> Self {
        self.router = self.router.nest(mount_path, module_router);
        self
    }

    /// Serve an OpenAPI document as raw JSON and through Swagger UI
    pub fn with_openapi(mut self, openapi: OpenApi) -> Self {
        let raw = openapi.clone();

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi),
        );

        // Raw document for tooling that does not speak Swagger UI
        self.router = self
            .router
            .route("/docs/openapi.json", get(move || async move { Json(raw) }));

        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Request ID generator producing time-ordered UUIDs
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse::<HeaderValue>().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Server",
    responses((status = 200, description = "OK", body = String))
)]
pub(crate) async fn health_check() -> &'static str {
    "ok"
}

#[derive(utoipa::OpenApi)]
#[openapi(
    info(title = "Bookshelf API", description = "Books catalogue REST API"),
    paths(health_check)
)]
struct ServerApi;

/// Join a module mount path with a module-relative route path
pub fn join_path(mount_path: &str, path: &str) -> String {
    let mount_path = mount_path.trim_end_matches('/');
    match path {
        "" | "/" if mount_path.is_empty() => "/".to_string(),
        "" | "/" => mount_path.to_string(),
        _ if path.starts_with('/') => format!("{mount_path}{path}"),
        _ => format!("{mount_path}/{path}"),
    }
}

/// Collect the OpenAPI documents of all modules into one, prefixing each
/// module's paths with its mount point
pub fn collect_openapi(registry: &ModuleRegistry, server: &ServerSettings) -> OpenApi {
    let mut openapi = ServerApi::openapi();

    for module in registry.modules() {
        let Some(mut module_doc) = module.openapi() else {
            continue;
        };

        let mount_path = server.module_path(module.name());
        let paths = std::mem::take(&mut module_doc.paths.paths);
        for (path, item) in paths {
            module_doc
                .paths
                .paths
                .insert(join_path(&mount_path, &path), item);
        }

        tracing::debug!(module = module.name(), %mount_path, "merging module OpenAPI document");
        openapi.merge(module_doc);
    }

    openapi
}
