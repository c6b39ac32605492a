use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use amusic_core::{EntityKind, Error, RowId};
use amusic_recommend::{ListKind, RecommendRequest, RecommendationEngine};
use amusic_storage::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::sessions::SessionStore;

/// Results per query when the body omits `limit`
const DEFAULT_LIMIT: usize = 10;

#[derive(Deserialize)]
struct RecommendBody {
    seed_id: Option<RowId>,
    seed_label: Option<String>,
    limit: Option<usize>,
    diversity: Option<f32>,
    exclude: Option<Vec<RowId>>,
}

#[derive(Serialize)]
struct KindInfo {
    kind: EntityKind,
    rows: usize,
    features: Vec<String>,
    metric: String,
}

/// Shared state of every worker
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<SessionStore>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(catalog: Arc<Catalog>, port: u16) -> std::io::Result<()> {
        let sessions = Arc::new(SessionStore::new());
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(AppState {
                    catalog: catalog.clone(),
                    sessions: sessions.clone(),
                }))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/kinds", web::get().to(list_kinds))
        .route("/kinds/{kind}/rows/{id}", web::get().to(get_row))
        .route("/kinds/{kind}/recommend", web::post().to(recommend))
        .route("/sessions", web::post().to(create_session))
        .route("/sessions/{id}", web::get().to(get_session))
        .route("/sessions/{id}", web::delete().to(delete_session))
        .route("/sessions/{id}/{list}/{label}", web::put().to(add_to_list))
        .route("/sessions/{id}/{list}/{label}", web::delete().to(remove_from_list));
}

fn engine_for(state: &AppState, kind: &str) -> Option<Arc<RecommendationEngine>> {
    let kind = kind.parse::<EntityKind>().ok()?;
    state.catalog.engine(kind)
}

fn not_found(what: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": format!("{} not found", what)
    }))
}

/// Query failures answer with an empty result alongside the message
fn query_error(err: &Error) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.to_string(),
        "result": []
    });
    match err {
        Error::SeedNotFound(_) => HttpResponse::NotFound().json(body),
        Error::FeatureMismatch { .. } => HttpResponse::Conflict().json(body),
        Error::Configuration(_) | Error::ShapeMismatch { .. } | Error::InsufficientData { .. } => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn list_kinds(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let kinds: Vec<KindInfo> = state
        .catalog
        .engines()
        .map(|engine| KindInfo {
            kind: engine.kind(),
            rows: engine.table().len(),
            features: engine.index().feature_names().to_vec(),
            metric: engine.index().metric().to_string(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(kinds))
}

async fn get_row(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (kind, id) = path.into_inner();
    let Some(engine) = engine_for(&state, &kind) else {
        return Ok(not_found("Kind"));
    };

    match engine.table().row_by_id(&RowId::parse(&id)) {
        Some(row) => Ok(HttpResponse::Ok().json(row)),
        None => Ok(not_found("Row")),
    }
}

async fn recommend(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RecommendBody>,
) -> ActixResult<HttpResponse> {
    let kind = path.into_inner();
    let Some(engine) = engine_for(&state, &kind) else {
        return Ok(not_found("Kind"));
    };
    let body = body.into_inner();

    let seed = match (body.seed_id, body.seed_label) {
        (Some(id), _) => id,
        (None, Some(label)) => {
            let found = engine.table().rows_by_label(&label).next().map(|row| row.id.clone());
            match found {
                Some(id) => id,
                None => return Ok(query_error(&Error::SeedNotFound(label))),
            }
        }
        (None, None) => {
            return Ok(query_error(&Error::Configuration(
                "either 'seed_id' or 'seed_label' must be provided".to_string(),
            )));
        }
    };

    let request = RecommendRequest {
        seed,
        count: body.limit.unwrap_or(DEFAULT_LIMIT),
        diversity: body.diversity,
        exclude: body.exclude,
    };
    debug!("POST /kinds/{}/recommend seed={}", kind, request.seed);

    match engine.recommend(&request) {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(query_error(&e)),
    }
}

async fn create_session(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let id = state.sessions.create();
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

async fn get_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    match state.sessions.get(&path.into_inner()) {
        Some(session) => Ok(HttpResponse::Ok().json(session)),
        None => Ok(not_found("Session")),
    }
}

async fn delete_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    if state.sessions.remove(&path.into_inner()) {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
    } else {
        Ok(not_found("Session"))
    }
}

async fn add_to_list(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String, String)>,
) -> ActixResult<HttpResponse> {
    update_list(&state, path.into_inner(), true)
}

async fn remove_from_list(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String, String)>,
) -> ActixResult<HttpResponse> {
    update_list(&state, path.into_inner(), false)
}

fn update_list(
    state: &AppState,
    (id, list, label): (Uuid, String, String),
    add: bool,
) -> ActixResult<HttpResponse> {
    let list = match list.parse::<ListKind>() {
        Ok(list) => list,
        Err(e) => return Ok(HttpResponse::NotFound().json(serde_json::json!({ "error": e }))),
    };

    let changed = state.sessions.update(&id, |session| {
        let items = session.list_mut(list);
        if add {
            items.add(&label)
        } else {
            items.remove(&label)
        }
    });

    match changed {
        Some(changed) => Ok(HttpResponse::Ok().json(serde_json::json!({ "changed": changed }))),
        None => Ok(not_found("Session")),
    }
}
