use allerguard::config::AppConfig;
use allerguard::error::AppError;
use allerguard::replay::{
    load_allowlist, load_document, load_scenarios, load_taxonomy, replay_corpus, run_gate,
    summarize, GateOutcome, ParsedAllowlist, ReplayReport, ReplaySummary, Scenario,
};
use allerguard::risk::{
    build_explanations, AdviceEntry, AdviceQuery, AdviceRegistry, Event, ExplanationEntry,
    Profile, RiskEngine, TaxonomySnapshot, Verdict,
};
use allerguard::telemetry;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    strict_gate_default: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "allerguard",
    about = "Run the allergy/interaction risk engine and its replay regression gate",
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
    /// Evaluate a profile and event batch against a taxonomy snapshot
    Evaluate(EvaluateArgs),
    /// Replay a scenario corpus under two snapshots and gate the diff
    Gate(GateArgs),
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

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to the profile JSON document
    #[arg(long)]
    profile: PathBuf,
    /// Path to the event batch JSON document
    #[arg(long)]
    events: PathBuf,
    /// Path to the taxonomy snapshot JSON document
    #[arg(long)]
    taxonomy: PathBuf,
    /// Emit the full response as JSON instead of the readable report
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GateArgs {
    /// Path to the historical scenario corpus
    #[arg(long)]
    scenarios: PathBuf,
    /// Path to the baseline taxonomy snapshot
    #[arg(long)]
    baseline: PathBuf,
    /// Path to the candidate taxonomy snapshot
    #[arg(long)]
    candidate: PathBuf,
    /// Optional allowlist document; absent means nothing is pre-approved
    #[arg(long)]
    allowlist: Option<PathBuf>,
    /// Fail on any unallowed risk-level change, not just increases
    #[arg(long)]
    strict: bool,
    /// Emit the full report as JSON instead of the readable summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    profile: Profile,
    events: Vec<Event>,
    taxonomy: TaxonomySnapshot,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    verdict: Verdict,
    advice: Vec<AdviceEntry>,
    explanations: Vec<ExplanationEntry>,
}

#[derive(Debug, Deserialize)]
struct GateRequest {
    scenarios: Vec<Scenario>,
    baseline: TaxonomySnapshot,
    candidate: TaxonomySnapshot,
    #[serde(default)]
    allowlist: Option<serde_json::Value>,
    #[serde(default)]
    strict: Option<bool>,
}

#[derive(Debug, Serialize)]
struct GateResponse {
    report: ReplayReport,
    summary: ReplaySummary,
    gate: GateOutcome,
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Gate(args) => run_gate_command(args),
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
        strict_gate_default: config.gate.strict,
    };

    let app = app_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "risk engine service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/risk/evaluate", post(evaluate_endpoint))
        .route("/api/v1/replay/gate", post(gate_endpoint))
        .with_state(state)
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let profile: Profile = load_document(&args.profile, "profile")?;
    let events: Vec<Event> = load_document(&args.events, "event batch")?;
    let taxonomy = load_taxonomy(&args.taxonomy)?;

    let response = evaluate(profile, events, taxonomy);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        render_evaluation(&response);
    }
    Ok(())
}

fn run_gate_command(args: GateArgs) -> Result<(), AppError> {
    let scenarios = load_scenarios(&args.scenarios)?;
    let baseline = load_taxonomy(&args.baseline)?;
    let candidate = load_taxonomy(&args.candidate)?;
    let allowlist = load_allowlist(args.allowlist.as_deref());

    let report = replay_corpus(&scenarios, &baseline, &candidate);
    let summary = summarize(&report.diffs);
    let gate = run_gate(&report, &allowlist, args.strict);
    let versions = format!("{} vs {}", report.baseline_version, report.candidate_version);

    if args.json {
        let response = GateResponse {
            report,
            summary,
            gate: gate.clone(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        render_gate(&versions, &summary, &gate);
    }

    if gate.passed {
        Ok(())
    } else {
        Err(AppError::GateRejected(gate.failures.len()))
    }
}

fn evaluate(profile: Profile, events: Vec<Event>, taxonomy: TaxonomySnapshot) -> EvaluateResponse {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(&profile, &events, &taxonomy);

    let registry = AdviceRegistry::curated();
    let parents = taxonomy.parent_index();
    let lookup = |term: &str| parents.get(term).cloned();
    let advice = registry.resolve(&AdviceQuery::from_verdict(&verdict), Some(&lookup));
    let explanations = build_explanations(&verdict);

    EvaluateResponse {
        verdict,
        advice,
        explanations,
    }
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

async fn evaluate_endpoint(Json(payload): Json<EvaluateRequest>) -> Json<EvaluateResponse> {
    let EvaluateRequest {
        profile,
        events,
        taxonomy,
    } = payload;
    Json(evaluate(profile, events, taxonomy))
}

async fn gate_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<GateRequest>,
) -> Json<GateResponse> {
    let GateRequest {
        scenarios,
        baseline,
        candidate,
        allowlist,
        strict,
    } = payload;

    let allowlist = allowlist
        .map(|value| allerguard::replay::parse_allowlist(&value))
        .unwrap_or_else(ParsedAllowlist::default);
    let strict = strict.unwrap_or(state.strict_gate_default);

    let report = replay_corpus(&scenarios, &baseline, &candidate);
    let summary = summarize(&report.diffs);
    let gate = run_gate(&report, &allowlist, strict);

    Json(GateResponse {
        report,
        summary,
        gate,
    })
}

fn render_evaluation(response: &EvaluateResponse) {
    println!("Risk evaluation");
    println!(
        "Verdict: {} (severity {}, taxonomy {})",
        response.verdict.risk_level.label(),
        response.verdict.meta.severity,
        response.verdict.meta.taxonomy_version
    );
    println!("Reasoning: {}", response.verdict.reasoning);

    if response.explanations.is_empty() {
        println!("\nExplanations: none");
    } else {
        println!("\nExplanations");
        for entry in &response.explanations {
            println!("- [{}] {}", entry.rule_code, entry.summary);
        }
    }

    if response.advice.is_empty() {
        println!("\nAdvice: none on record");
    } else {
        println!("\nAdvice");
        for entry in &response.advice {
            println!("- {}: {}", entry.target, entry.guidance);
        }
    }
}

fn render_gate(versions: &str, summary: &ReplaySummary, gate: &GateOutcome) {
    println!("Replay gate ({versions})");
    println!(
        "Scenarios: {} | risk up: {} | risk down: {} | matches +{}/-{}",
        summary.scenarios,
        summary.risk_increases,
        summary.risk_decreases,
        summary.added_matches,
        summary.removed_matches
    );

    if gate.passed {
        println!("\nGate: PASSED");
    } else {
        println!("\nGate: FAILED");
        for failure in &gate.failures {
            println!("- {failure}");
        }
    }
}
