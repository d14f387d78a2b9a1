use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use hireflow::config::AppConfig;
use hireflow::error::AppError;
use hireflow::telemetry;
use hireflow::workflows::applicant::{
    status_router, ApplicantStatusService, HttpStatusGateway, StageCatalog, StatusId,
    TracingEvents,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "hireflow",
    about = "Run the applicant status workflow service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the hiring pipeline without starting the service
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Show which statuses a transition would skip and which prompts it needs
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Current status identifier (e.g. UNPROCESSED)
    #[arg(long)]
    from: String,
    /// Requested status identifier (e.g. FIRST_INTERVIEW)
    #[arg(long)]
    to: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Pipeline {
            command: PipelineCommand::Check(args),
        } => run_pipeline_check(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let catalog = Arc::new(StageCatalog::standard());
    let gateway = Arc::new(HttpStatusGateway::new(config.tracking.base_url.clone()));
    let events = Arc::new(TracingEvents);
    let service = Arc::new(ApplicantStatusService::new(catalog, gateway, events));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(status_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "applicant status workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_pipeline_check(args: CheckArgs) -> Result<(), AppError> {
    let catalog = StageCatalog::standard();
    let from = StatusId::new(args.from);
    let to = StatusId::new(args.to);

    // User input, not engine state: report unknown identifiers instead of
    // tripping the validator's programming-error assertion.
    for status in [&from, &to] {
        if !catalog.contains(status) {
            return Err(AppError::Pipeline(format!(
                "'{status}' is not a known status; valid statuses: {}",
                catalog
                    .statuses()
                    .iter()
                    .map(StatusId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    let checks = hireflow::workflows::applicant::validate(&from, &to, &catalog);

    println!("Transition check: {from} -> {to}");
    if checks.skipped.is_empty() {
        println!("Skipped statuses: none");
    } else {
        println!("Skipped statuses (confirmation required)");
        for status in &checks.skipped {
            println!("- {} ({})", status, catalog.label_of(status));
        }
    }

    println!("\nPrompts before commit");
    println!("- effective date: always");
    if checks.requires_email_preview {
        println!("- email preview: committing this status sends the assessment email");
    }
    if checks.requires_blacklist_fields {
        println!("- blacklist type and reason: mandatory for this status");
    }
    if checks.requires_rejection_reason {
        println!("- rejection reason: mandatory for this status");
    }
    if checks.is_plain() {
        println!("- no other prompts");
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
