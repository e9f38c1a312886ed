//! Single binary web server: bracket generation and match progression via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, REGISTRATIONS_CSV, CATEGORY_LIMITS.

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use wod_battle_bracket::{
    assign_wod, champion, declare_winner, find_match_view, generate_bracket, get_bracket,
    matches_for_participant, matches_in_round, record_match_result, schedule_match, start_match,
    AppConfig, BracketError, BracketKey, Category, CategoryLimits, InMemoryMatchStore, MatchId,
    MatchView, ParticipantId, RandomShuffle, Registration, RegistrationBook, RegistrationSource,
    RegistrationStatus, ResultInput, Slot, TournamentId, Wod,
};

/// Shared state: match store, registration book and category limits.
struct Backend {
    matches: InMemoryMatchStore,
    registrations: RegistrationBook,
    limits: CategoryLimits,
}

type AppState = Data<Backend>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct GenerateBracketBody {
    tournament_id: TournamentId,
    category: String,
}

#[derive(serde::Serialize)]
struct GenerateBracketResponse {
    total_rounds: u32,
    matches: usize,
}

#[derive(Deserialize)]
struct AddRegistrationBody {
    #[serde(default)]
    participant_id: Option<ParticipantId>,
    tournament_id: TournamentId,
    category: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    status: RegistrationStatus,
}

#[derive(Deserialize)]
struct DeclareWinnerBody {
    slot: Slot,
}

#[derive(Deserialize)]
struct ScheduleBody {
    scheduled_at: DateTime<Utc>,
}

/// Path segments: tournament id and category (e.g. /api/brackets/{tournament_id}/{category})
#[derive(Deserialize)]
struct BracketPath {
    tournament_id: TournamentId,
    category: String,
}

#[derive(Deserialize)]
struct RoundPath {
    tournament_id: TournamentId,
    category: String,
    round: u32,
}

/// Path segment: match or participant id.
#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

/// Map a core error to a response. Corruption is a server fault (already logged by the core).
fn error_response(e: BracketError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        BracketError::BracketCorruption(_) => HttpResponse::InternalServerError().json(body),
        BracketError::BracketNotFound { .. } | BracketError::MatchNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        BracketError::BracketAlreadyExists { .. } | BracketError::InvalidTransition { .. } => {
            HttpResponse::Conflict().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond_match(result: Result<wod_battle_bracket::Match, BracketError>, state: &Backend) -> HttpResponse {
    match result {
        Ok(m) => HttpResponse::Ok().json(MatchView::new(m, &state.registrations)),
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "wod-battle-bracket",
    })
}

/// Add (or replace) a registration in the in-memory book.
#[post("/api/registrations")]
async fn api_add_registration(state: AppState, body: Json<AddRegistrationBody>) -> HttpResponse {
    let body = body.into_inner();
    let category = Category::parse(&body.category);
    if category.is_empty() {
        return error_response(BracketError::UnknownCategory(body.category));
    }
    let registration = Registration {
        participant_id: body.participant_id.unwrap_or_else(Uuid::new_v4),
        tournament_id: body.tournament_id,
        category,
        first_name: body.first_name,
        last_name: body.last_name,
        status: body.status,
    };
    state.registrations.add(registration.clone());
    HttpResponse::Created().json(registration)
}

/// Generate the bracket of one category from its confirmed registrations.
#[post("/api/brackets")]
async fn api_generate_bracket(state: AppState, body: Json<GenerateBracketBody>) -> HttpResponse {
    let category = Category::parse(&body.category);
    let mut shuffle = RandomShuffle::new(rand::thread_rng());
    match generate_bracket(
        &state.matches,
        &state.registrations,
        &state.limits,
        body.tournament_id,
        &category,
        &mut shuffle,
    ) {
        Ok(bracket) => HttpResponse::Created().json(GenerateBracketResponse {
            total_rounds: bracket.total_rounds,
            matches: bracket.matches.len(),
        }),
        Err(e) => error_response(e),
    }
}

#[get("/api/brackets/{tournament_id}/{category}")]
async fn api_get_bracket(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    let category = Category::parse(&path.category);
    match get_bracket(&state.matches, &state.registrations, path.tournament_id, &category) {
        Ok(views) => HttpResponse::Ok().json(views),
        Err(e) => error_response(e),
    }
}

#[get("/api/brackets/{tournament_id}/{category}/rounds/{round}")]
async fn api_get_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let category = Category::parse(&path.category);
    match matches_in_round(
        &state.matches,
        &state.registrations,
        path.tournament_id,
        &category,
        path.round,
    ) {
        Ok(views) => HttpResponse::Ok().json(views),
        Err(e) => error_response(e),
    }
}

/// Champion of a category: the winner of its final, null until decided.
#[get("/api/brackets/{tournament_id}/{category}/champion")]
async fn api_get_champion(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    let key = BracketKey::new(path.tournament_id, Category::parse(&path.category));
    match champion(&state.matches, &key) {
        Ok(winner) => HttpResponse::Ok().json(serde_json::json!({
            "champion": winner,
            "name": winner.and_then(|id| state.registrations.display_name(id)),
        })),
        Err(e) => error_response(e),
    }
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match find_match_view(&state.matches, &state.registrations, path.id) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(e),
    }
}

#[get("/api/participants/{id}/matches")]
async fn api_participant_matches(state: AppState, path: Path<IdPath>) -> HttpResponse {
    HttpResponse::Ok().json(matches_for_participant(
        &state.matches,
        &state.registrations,
        path.id,
    ))
}

/// Start a match (pending -> in_progress).
#[put("/api/matches/{id}/start")]
async fn api_start_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let id: MatchId = path.id;
    respond_match(start_match(&state.matches, id), &state)
}

/// Record scores (in_progress -> completed) and advance the winner.
#[put("/api/matches/{id}/result")]
async fn api_record_result(state: AppState, path: Path<IdPath>, body: Json<ResultInput>) -> HttpResponse {
    respond_match(
        record_match_result(&state.matches, path.id, body.into_inner()),
        &state,
    )
}

/// Settle a completed match that ended without a winner.
#[put("/api/matches/{id}/winner")]
async fn api_declare_winner(state: AppState, path: Path<IdPath>, body: Json<DeclareWinnerBody>) -> HttpResponse {
    respond_match(declare_winner(&state.matches, path.id, body.slot), &state)
}

#[put("/api/matches/{id}/wod")]
async fn api_assign_wod(state: AppState, path: Path<IdPath>, body: Json<Wod>) -> HttpResponse {
    respond_match(assign_wod(&state.matches, path.id, body.into_inner()), &state)
}

#[put("/api/matches/{id}/schedule")]
async fn api_schedule_match(state: AppState, path: Path<IdPath>, body: Json<ScheduleBody>) -> HttpResponse {
    respond_match(schedule_match(&state.matches, path.id, body.scheduled_at), &state)
}

fn load_registrations(config: &AppConfig) -> RegistrationBook {
    let Some(path) = &config.registrations_csv else {
        return RegistrationBook::new();
    };
    match RegistrationBook::from_path(path) {
        Ok(book) => {
            log::info!("Loaded {} registration(s) from {}", book.len(), path.display());
            book
        }
        Err(e) => {
            log::warn!("Could not load registrations from {}: {}", path.display(), e);
            RegistrationBook::new()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(Backend {
        matches: InMemoryMatchStore::new(),
        registrations: load_registrations(&config),
        limits: config.category_limits.clone(),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_add_registration)
            .service(api_generate_bracket)
            .service(api_get_round)
            .service(api_get_champion)
            .service(api_get_bracket)
            .service(api_get_match)
            .service(api_participant_matches)
            .service(api_start_match)
            .service(api_record_result)
            .service(api_declare_winner)
            .service(api_assign_wod)
            .service(api_schedule_match)
    })
    .bind(bind)?
    .run()
    .await
}
