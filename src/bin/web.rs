//! Bracket edit server: REST API over the tournament record store.
//! Run with: cargo run --bin web
//! Settings come from the environment (HOST, PORT, DATABASE, SESSION_SECRET); see `bracket_edit::config`.

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_edit::{
    change_handler, ChangeError, ChangesValidator, Config, Database, Edit, Setup, Status, Store,
    Tournament, TournamentId, UserId,
};
use serde::Deserialize;
use serde_json::Value;

type AppState = Data<Database>;

const SESSION_USER_KEY: &str = "user_id";

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct SessionBody {
    user: UserId,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

fn error_body(msg: impl std::fmt::Display) -> Value {
    serde_json::json!({ "error": msg.to_string() })
}

/// Map each edit failure kind to its own status code.
fn change_error_response(e: &ChangeError) -> HttpResponse {
    match e {
        ChangeError::BadRequest(_) => HttpResponse::BadRequest().json(error_body(e)),
        ChangeError::NotAuthorized => HttpResponse::Unauthorized().json(error_body(e)),
        ChangeError::NotImplemented(_) => HttpResponse::NotImplemented().json(error_body(e)),
        ChangeError::Conflict => HttpResponse::Conflict().json(error_body(e)),
        ChangeError::Invariant(_) | ChangeError::Store(_) => {
            HttpResponse::InternalServerError().json(error_body(e))
        }
    }
}

fn session_user(session: &Session) -> Option<UserId> {
    session.get::<UserId>(SESSION_USER_KEY).ok().flatten()
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-edit",
    })
}

/// Remember which user is making requests from this browser.
#[post("/api/session")]
async fn api_login(session: Session, body: Json<SessionBody>) -> HttpResponse {
    match session.insert(SESSION_USER_KEY, body.user) {
        Ok(()) => {
            session.renew();
            HttpResponse::Ok().json(serde_json::json!({ "user": body.user }))
        }
        Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
    }
}

#[delete("/api/session")]
async fn api_logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Store a tournament record; the session user becomes its organizer.
/// Started records must already carry a consistent bracket graph.
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    session: Session,
    body: Json<Value>,
) -> HttpResponse {
    let Some(user) = session_user(&session) else {
        return HttpResponse::Unauthorized().json(error_body(ChangeError::NotAuthorized));
    };
    let mut record = body.into_inner();
    if let Some(info) = record.get_mut("information").and_then(Value::as_object_mut) {
        info.insert("organizer".to_string(), Value::from(user));
    }
    let setup: Setup = match serde_json::from_value(record.clone()) {
        Ok(s) => s,
        Err(e) => return HttpResponse::BadRequest().json(error_body(e)),
    };
    if setup.status == Status::Started {
        if let Err(e) = Tournament::from_record(record.clone()) {
            return HttpResponse::BadRequest().json(error_body(e));
        }
    }
    let store = state.clone();
    match web::block(move || store.insert(record)).await {
        Ok(Ok(id)) => {
            log::info!("User {} created tournament {}", user, id);
            HttpResponse::Created().json(serde_json::json!({ "id": id }))
        }
        Ok(Err(e)) => HttpResponse::InternalServerError().json(error_body(e)),
        Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
    }
}

/// Get a tournament record with its revision (404 if not found).
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match state.load(path.id) {
        Ok(Some(versioned)) => HttpResponse::Ok().json(versioned),
        Ok(None) => HttpResponse::NotFound().json(error_body("No tournament")),
        Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
    }
}

/// Apply one edit (name, score or winner) to a started tournament.
#[post("/api/tournaments/{id}/changes")]
async fn api_change(
    state: AppState,
    session: Session,
    path: Path<TournamentPath>,
    body: Json<Edit>,
) -> HttpResponse {
    let Some(user) = session_user(&session) else {
        return change_error_response(&ChangeError::NotAuthorized);
    };
    let id = path.id;
    let edit = body.into_inner();
    let store = state.clone();
    let result = web::block(move || {
        change_handler(user, store.get_ref(), &ChangesValidator, id, edit)
    })
    .await;
    match result {
        Ok(Ok(tournament)) => HttpResponse::Ok().json(tournament),
        Ok(Err(e)) => {
            if e.is_fatal() {
                log::error!("Edit on tournament {} aborted: {}", id, e);
            } else {
                log::warn!("Edit on tournament {} rejected: {}", id, e);
            }
            change_error_response(&e)
        }
        Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
    }
}

/// Read the snapshot file if configured; a missing file starts an empty database there.
async fn open_database(config: &Config) -> std::io::Result<Database> {
    let Some(path) = &config.database else {
        log::info!("No DATABASE set, keeping tournaments in memory only");
        return Ok(Database::in_memory());
    };
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    Database::from_snapshot(&bytes, Some(path.clone()))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

fn session_key(config: &Config) -> Key {
    match config.session_secret.as_deref().map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(_)) => {
            log::warn!("SESSION_SECRET shorter than 64 bytes, generating a key");
            Key::generate()
        }
        None => Key::generate(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let state = Data::new(open_database(&config).await?);
    let key = session_key(&config);

    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(state.clone())
            .service(api_health)
            .service(api_login)
            .service(api_logout)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_change)
    })
    .bind(bind)?
    .run()
    .await
}
