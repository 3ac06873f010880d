use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use db_infra::DbKind;
use duel_backend::collaborators::http::{HttpImageGenerator, HttpNarrator};
use duel_backend::collaborators::memory::{
    DisabledImageGenerator, EchoNarrator, InMemoryCreditLedger, InMemoryObjectStorage,
    InMemoryWizardRegistry,
};
use duel_backend::collaborators::{
    Collaborators, ImageBackend, ImageBackends, ImageGenerator, ImageProcessor, Narrator,
    PassthroughProcessor, ResizeJpegProcessor,
};
use duel_backend::config::{CollaboratorEndpoints, EngineConfig, ServerConfig};
use duel_backend::infra::state::build_state;
use duel_backend::middleware::request_trace::RequestTrace;
use duel_backend::middleware::structured_logger::StructuredLogger;
use duel_backend::{routes, AppError};
use tracing::{info, warn};

mod telemetry;

fn build_collaborators(
    endpoints: &CollaboratorEndpoints,
    config: &EngineConfig,
) -> Result<Collaborators, AppError> {
    let narrator: Arc<dyn Narrator> = match &endpoints.narrator_url {
        Some(url) => Arc::new(HttpNarrator::new(url.as_str()).map_err(|e| AppError::config(e.to_string()))?),
        None => {
            warn!("DUEL_NARRATOR_URL not set; using the echo narrator");
            Arc::new(EchoNarrator)
        }
    };

    let generator = |backend: ImageBackend| -> Result<Arc<dyn ImageGenerator>, AppError> {
        match &endpoints.image_url {
            Some(url) => Ok(Arc::new(
                HttpImageGenerator::new(url.as_str(), backend)
                    .map_err(|e| AppError::config(e.to_string()))?,
            )),
            None => Ok(Arc::new(DisabledImageGenerator)),
        }
    };
    if endpoints.image_url.is_none() {
        warn!("DUEL_IMAGE_URL not set; rounds will be text-only");
    }

    let processor: Arc<dyn ImageProcessor> = if config.compress_images {
        Arc::new(ResizeJpegProcessor {
            max_dimension: config.image_max_dimension,
            quality: config.image_jpeg_quality,
        })
    } else {
        Arc::new(PassthroughProcessor)
    };

    Ok(Collaborators {
        narrator,
        images: ImageBackends {
            prompt_only: generator(ImageBackend::PromptOnly)?,
            context_aware: generator(ImageBackend::ContextAware)?,
        },
        credits: Arc::new(InMemoryCreditLedger::new()),
        storage: Arc::new(InMemoryObjectStorage::new()),
        wizards: Arc::new(InMemoryWizardRegistry::new()),
        processor,
    })
}

async fn run() -> Result<(), AppError> {
    let server = ServerConfig::from_env()?;
    let config = EngineConfig::from_env()?;
    let db_kind = match std::env::var("DUEL_DB_KIND") {
        Ok(raw) => DbKind::from_str(&raw).map_err(|e| AppError::config(e.to_string()))?,
        Err(_) => DbKind::Postgres,
    };
    let collaborators = build_collaborators(&CollaboratorEndpoints::from_env(), &config)?;

    let app_state = build_state()
        .with_db(db_kind)
        .with_collaborators(collaborators)
        .with_config(config)
        .build()
        .await?;
    let shutdown = app_state.shutdown.clone();
    let data = web::Data::new(app_state);

    info!(host = %server.host, port = server.port, "starting duel backend");
    HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((server.host.as_str(), server.port))
    .map_err(|e| AppError::config(format!("failed to bind: {e}")))?
    .run()
    .await
    .map_err(|e| AppError::internal(format!("server error: {e}")))?;

    shutdown.cancel();
    Ok(())
}

#[actix_web::main]
async fn main() {
    telemetry::init_tracing();

    if let Err(err) = run().await {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
