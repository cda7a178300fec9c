use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, App, HttpServer};
use revenor_agents::review::agent::{ReviewAgent, TransactionReviewer};
use revenor_agents::OpenAiClient;
use revenor_api::config::ApiConfig;
use revenor_api::database::Database;
use revenor_api::handlers;
use revenor_api::handlers::health::StartedAt;
use revenor_api::helpers::cors::origin_allowed;
use revenor_api::integrations::pdf_extractor::{
    HttpExtractor, StatementExtractor, SubprocessExtractor,
};
use revenor_api::jobs::analysis_manager::{db_message_sink, AnalysisManager};
use revenor_api::jobs::registry::SessionRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();

    let (config, config_path) = ApiConfig::load().expect("Failed to load configuration");
    info!("Configuration loaded from {}", config_path.display());

    let db_path = config.database_path();
    let db = Arc::new(Database::new(&db_path).expect("Failed to initialize database"));
    info!("Database initialized at {:?}", db_path);

    let extractor_config = config
        .extractor
        .clone()
        .expect("Either extractor.path or extractor.url must be configured");
    let extractor: Arc<dyn StatementExtractor> = if let Some(path) = extractor_config.path {
        info!("Using subprocess extractor at {:?}", path);
        Arc::new(SubprocessExtractor::new(path))
    } else if let Some(url) = extractor_config.url {
        info!("Using HTTP extractor at {}", url);
        Arc::new(HttpExtractor::new(&url))
    } else {
        panic!("Either extractor.path or extractor.url must be configured")
    };

    let llm_client = match config.llm_api_key() {
        Some(api_key) => Some(Arc::new(
            OpenAiClient::new(
                &api_key,
                config.llm_model(),
                Duration::from_millis(config.llm_timeout_ms()),
                config.llm_max_retries(),
            )
            .expect("Failed to build LLM client"),
        )),
        None => {
            warn!("LLM API key not configured; ambiguous transactions cannot be reviewed");
            None
        }
    };
    let reviewer: Option<Arc<dyn TransactionReviewer>> = llm_client.clone().map(|client| {
        Arc::new(ReviewAgent::new(
            client,
            db_message_sink(db.async_connection.clone()),
        )) as Arc<dyn TransactionReviewer>
    });

    let registry = Arc::new(SessionRegistry::new());
    let manager = Arc::new(AnalysisManager::new(
        db.async_connection.clone(),
        registry,
        extractor,
        reviewer,
        llm_client,
    ));

    let origins = config.allowed_origins();
    let server_config =
        config
            .server
            .clone()
            .unwrap_or_else(|| revenor_api::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            });
    let started = web::Data::new(StartedAt(Instant::now()));
    let config_data = web::Data::new(config);

    info!(
        "Starting server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        let origins = origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req| {
                origin
                    .to_str()
                    .map(|o| origin_allowed(o, &origins))
                    .unwrap_or(false)
            })
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(manager.clone()))
            .app_data(started.clone())
            .app_data(config_data.clone())
            .app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
            .wrap(cors)
            .service(handlers::health::health)
            .service(handlers::health::ping)
            .service(
                web::scope("/api")
                    .wrap(DefaultHeaders::new().add(("Cache-Control", "no-store")))
                    .route("/analysis", web::post().to(handlers::analysis::submit_analysis))
                    .route("/reports", web::get().to(handlers::reports::list_reports))
                    .route(
                        "/reports/{session_id}",
                        web::get().to(handlers::reports::get_report),
                    )
                    .route(
                        "/reports/{session_id}/messages",
                        web::get().to(handlers::reports::get_messages),
                    )
                    .route(
                        "/reports/{session_id}",
                        web::delete().to(handlers::reports::delete_report),
                    ),
            )
    })
    .bind((server_config.host.as_str(), server_config.port))?
    .shutdown_timeout(10)
    .run()
    .await
}
