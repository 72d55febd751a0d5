//! docupiped - binary entry point.
//!
//! Loads configuration, wires the Artifact Store (Postgres), the Object
//! Store, the Word codec and model endpoint adapters, the Pipeline
//! Coordinator and its `JobHandler`s, the Job Scheduler worker pool (C8),
//! and the HTTP edge (§6/§10.3), then runs until `Ctrl-C` drains in-flight
//! jobs before exiting.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docupipe::adapters::{
    DeterministicMockModelEndpoint, DocxCodec, HttpModelEndpoint, HttpModelEndpointConfig,
    InMemoryObjectStore, JobWorkerLoop, LocalFileObjectStore, PostgresAssembledDocumentRepository,
    PostgresAuditLogRepository, PostgresDocumentRepository, PostgresDocumentVersionRepository,
    PostgresGenerationInputBatchRepository, PostgresJobRepository,
    PostgresRenderedDocumentRepository, PostgresSectionOutputBatchRepository,
    PostgresSectionRepository, PostgresTemplateRepository, PostgresTemplateVersionRepository,
    ScriptedMockModelEndpoint, WorkerLoopConfig,
};
use docupipe::application::{
    DemoSeeder, GenerateDocumentHandler, JobRouter, PipelineCoordinator, RegenerateDocumentHandler,
};
use docupipe::adapters::http::{pipeline_routes, PipelineAppState};
use docupipe::config::{AppConfig, ModelEndpointProvider, ObjectStoreBackend};
use docupipe::ports::{JobHandler, ModelEndpoint, ObjectStore};

const WORKER_COUNT: usize = 4;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server.log_level);

    info!(environment = ?config.server.environment, "starting docupiped");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate::Migrator::new(std::path::Path::new("./migrations"))
            .await?
            .run(&pool)
            .await?;
    }

    let templates = Arc::new(PostgresTemplateRepository::new(pool.clone()));
    let template_versions = Arc::new(PostgresTemplateVersionRepository::new(pool.clone()));
    let sections = Arc::new(PostgresSectionRepository::new(pool.clone()));
    let documents = Arc::new(PostgresDocumentRepository::new(pool.clone()));
    let document_versions = Arc::new(PostgresDocumentVersionRepository::new(pool.clone()));
    let input_batches = Arc::new(PostgresGenerationInputBatchRepository::new(pool.clone()));
    let output_batches = Arc::new(PostgresSectionOutputBatchRepository::new(pool.clone()));
    let assembled_documents = Arc::new(PostgresAssembledDocumentRepository::new(pool.clone()));
    let rendered_documents = Arc::new(PostgresRenderedDocumentRepository::new(pool.clone()));
    let jobs = Arc::new(PostgresJobRepository::new(pool.clone()));
    let audit_log = Arc::new(PostgresAuditLogRepository::new(pool.clone()));

    let object_store: Arc<dyn ObjectStore> = match config.object_store.backend {
        ObjectStoreBackend::LocalFile => Arc::new(LocalFileObjectStore::new(config.object_store.base_path.clone())),
        ObjectStoreBackend::InMemory => Arc::new(InMemoryObjectStore::new()),
    };

    let model_endpoint: Arc<dyn ModelEndpoint> = match config.model_endpoint.provider {
        ModelEndpointProvider::Http => {
            let endpoint_config = HttpModelEndpointConfig {
                base_url: config.model_endpoint.base_url.clone().unwrap_or_default(),
                api_key: config
                    .model_endpoint
                    .api_key
                    .clone()
                    .unwrap_or_else(|| secrecy::SecretString::new(String::new())),
                timeout: config.model_endpoint.timeout(),
            };
            Arc::new(HttpModelEndpoint::new(endpoint_config))
        }
        ModelEndpointProvider::ScriptedMock => Arc::new(ScriptedMockModelEndpoint::new()),
        ModelEndpointProvider::DeterministicMock => Arc::new(DeterministicMockModelEndpoint::new()),
    };

    let renderer = Arc::new(DocxCodec::new());

    let coordinator = Arc::new(PipelineCoordinator {
        template_versions: template_versions.clone(),
        sections: sections.clone(),
        documents: documents.clone(),
        document_versions: document_versions.clone(),
        input_batches: input_batches.clone(),
        output_batches: output_batches.clone(),
        assembled_documents,
        rendered_documents,
        audit_log: audit_log.clone(),
        object_store: object_store.clone(),
        model_endpoint,
        renderer,
        validator_constraints: config.pipeline.validator_constraints(),
        retry_policy: config.pipeline.retry_policy(),
    });

    let generate_handler: Arc<dyn JobHandler> = Arc::new(GenerateDocumentHandler::new(coordinator.clone()));
    let regenerate_handler: Arc<dyn JobHandler> = Arc::new(RegenerateDocumentHandler::new(
        coordinator.clone(),
        documents.clone(),
        document_versions,
        template_versions.clone(),
        sections.clone(),
        input_batches.clone(),
        output_batches.clone(),
    ));
    let router: Arc<dyn JobHandler> = Arc::new(JobRouter::new(generate_handler.clone(), regenerate_handler.clone()));

    let demo_seeder = Arc::new(DemoSeeder {
        templates,
        template_versions,
        sections,
        documents,
        object_store,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut worker_handles = Vec::with_capacity(WORKER_COUNT);
    for worker_index in 0..WORKER_COUNT {
        let worker = JobWorkerLoop::new(jobs.clone(), router.clone(), WorkerLoopConfig::new(format!("worker-{worker_index}")));
        let worker_shutdown = shutdown_rx.clone();
        worker_handles.push(tokio::spawn(async move {
            if let Err(e) = worker.run(worker_shutdown).await {
                error!(error = %e, "job worker loop exited with an error");
            }
        }));
    }

    let state = PipelineAppState { coordinator, regenerate: router, audit_log, demo_seeder };

    let cors = match config.server.cors_origins_list().as_slice() {
        [] => CorsLayer::new().allow_origin(AllowOrigin::any()),
        origins => {
            let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new().allow_origin(parsed)
        }
    };

    let app = axum::Router::new()
        .nest("/api", pipeline_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
    info!(addr = %config.server.socket_addr(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, draining workers");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }

    info!("docupiped stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
