//! JSON API over the league core: leaderboard, reconciliation runs, and brackets.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Set LEAGUE_DATA_DIR to a directory with players.csv / matches.csv to load a dataset.

use actix_web::{
    get, post,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use league_ratings::config::Settings;
use league_ratings::logic::{RunError, RunnerConfig};
use league_ratings::store::load_dataset;
use league_ratings::{
    record_result, MemoryStore, ParticipantId, ParticipantKind, ReconciliationRunner,
    TournamentError, TournamentId, TournamentRegistry,
};
use serde::Deserialize;
use std::sync::Arc;

type Runner = ReconciliationRunner<Arc<MemoryStore>>;

/// Shared state: one store, one runner per participant kind, and all tournaments.
struct AppState {
    store: Arc<MemoryStore>,
    player_runner: Runner,
    team_runner: Runner,
    tournaments: TournamentRegistry,
}

impl AppState {
    fn new(store: MemoryStore, write_attempts: u32) -> Self {
        let store = Arc::new(store);
        let runner = |kind| {
            ReconciliationRunner::new(
                Arc::clone(&store),
                RunnerConfig {
                    kind,
                    write_attempts,
                },
            )
        };
        Self {
            player_runner: runner(ParticipantKind::Player),
            team_runner: runner(ParticipantKind::Team),
            store: Arc::clone(&store),
            tournaments: TournamentRegistry::new(),
        }
    }

    fn runner(&self, kind: ParticipantKind) -> &Runner {
        match kind {
            ParticipantKind::Player => &self.player_runner,
            ParticipantKind::Team => &self.team_runner,
        }
    }
}

type SharedState = Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct KindQuery {
    #[serde(default)]
    kind: ParticipantKind,
}

#[derive(Deserialize)]
struct KindPath {
    kind: ParticipantKind,
}

#[derive(Deserialize)]
struct ParticipantPath {
    id: ParticipantId,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    participant_ids: Vec<ParticipantId>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct BracketMatchPath {
    id: TournamentId,
    round: u32,
    match_index: usize,
}

#[derive(Deserialize)]
struct RecordResultBody {
    score_1: i32,
    score_2: i32,
}

fn error_json(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn tournament_error_response(e: TournamentError) -> HttpResponse {
    match e {
        TournamentError::TournamentNotFound(_) | TournamentError::MatchNotFound { .. } => {
            HttpResponse::NotFound().json(error_json(e))
        }
        TournamentError::InvalidState { .. } => HttpResponse::Conflict().json(error_json(e)),
        _ => HttpResponse::BadRequest().json(error_json(e)),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "league-ratings",
    })
}

/// Participants of one kind, highest rating first.
#[get("/api/participants")]
async fn api_leaderboard(state: SharedState, query: Query<KindQuery>) -> HttpResponse {
    match state.store.leaderboard(query.kind) {
        Ok(participants) => HttpResponse::Ok().json(participants),
        Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
    }
}

#[get("/api/participants/{id}/history")]
async fn api_participant_history(state: SharedState, path: Path<ParticipantPath>) -> HttpResponse {
    match state.store.history_for(path.id) {
        Ok(history) => HttpResponse::Ok().json(history),
        Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
    }
}

/// Replay the full history for one kind and persist the result.
#[post("/api/reconciliation/{kind}")]
async fn api_reconcile(state: SharedState, path: Path<KindPath>) -> HttpResponse {
    let kind = path.kind;
    let state = state.into_inner();
    let outcome = tokio::task::spawn_blocking(move || state.runner(kind).run()).await;
    match outcome {
        Ok(Ok(summary)) => HttpResponse::Ok().json(summary),
        Ok(Err(e @ RunError::AlreadyRunning)) => HttpResponse::Conflict().json(error_json(e)),
        Ok(Err(e)) => HttpResponse::InternalServerError().json(error_json(e)),
        Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
    }
}

/// Seed a new bracket from stored participants.
#[post("/api/tournaments")]
async fn api_create_tournament(state: SharedState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let mut participants = Vec::with_capacity(body.participant_ids.len());
    for &id in &body.participant_ids {
        match state.store.participant(id) {
            Ok(p) => participants.push(p),
            Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
        }
    }
    match state.tournaments.create(&participants) {
        Ok(tournament) => {
            log::info!(
                "Created tournament {} with {} participants",
                tournament.id,
                participants.len()
            );
            HttpResponse::Ok().json(tournament)
        }
        Err(e) => tournament_error_response(e),
    }
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    match state.tournaments.get(path.id) {
        Ok(tournament) => HttpResponse::Ok().json(tournament),
        Err(e) => tournament_error_response(e),
    }
}

/// Record a result for a pending bracket match; winners advance automatically.
#[post("/api/tournaments/{id}/rounds/{round}/matches/{match_index}/result")]
async fn api_record_result(
    state: SharedState,
    path: Path<BracketMatchPath>,
    body: Json<RecordResultBody>,
) -> HttpResponse {
    let outcome = state.tournaments.with_tournament(path.id, |t| {
        record_result(t, path.round, path.match_index, body.score_1, body.score_2)?;
        Ok(t.clone())
    });
    match outcome {
        Ok(tournament) => HttpResponse::Ok().json(tournament),
        Err(e) => tournament_error_response(e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();
    let store = match &settings.data_dir {
        Some(dir) => match load_dataset(dir) {
            Ok(store) => {
                log::info!("Loaded league dataset from {}", dir.display());
                store
            }
            Err(e) => {
                log::error!("Failed to load dataset from {}: {}", dir.display(), e);
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
            }
        },
        None => MemoryStore::new(),
    };
    let state = Data::new(AppState::new(store, settings.write_attempts));

    let bind = (settings.host.clone(), settings.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_leaderboard)
            .service(api_participant_history)
            .service(api_reconcile)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_record_result)
    })
    .bind(bind)?
    .run()
    .await
}
