#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::dataset::{DepartmentRow, StudentsDataset, check_consistency};
use crate::downloader;
use crate::loader::{self, DataSource, LoadError};
use crate::render::{self, PageData};
use crate::selection::{Action, DashboardState, Tab, reduce, selected_record};
use crate::table::{self, DepartmentView, SortDirection, SortKey, SortState, Totals};

/// Progress of the one-shot dataset load.
#[derive(Clone, Debug)]
pub enum LoadState {
    Loading,
    Ready(Arc<StudentsDataset>),
    Failed(String),
}

impl LoadState {
    pub fn page_data(&self) -> PageData<'_> {
        match self {
            LoadState::Loading => PageData::Loading,
            LoadState::Ready(dataset) => PageData::Ready(dataset.as_ref()),
            LoadState::Failed(message) => PageData::Failed(message.as_str()),
        }
    }
}

pub struct AppState {
    load: RwLock<LoadState>,
    closed: AtomicBool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            load: RwLock::new(LoadState::Loading),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_dataset(dataset: StudentsDataset) -> Self {
        let state = Self::new();
        state.finish_load(Ok(dataset));
        state
    }

    pub fn snapshot(&self) -> LoadState {
        self.load.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Records the outcome of the dataset load. Once the state is closed
    /// the outcome is dropped and `false` is returned.
    pub fn finish_load(&self, result: Result<StudentsDataset, LoadError>) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }

        let next = match result {
            Ok(dataset) => {
                info!(
                    "dataset loaded: {} records, years {:?}",
                    dataset.records.len(),
                    dataset.available_years()
                );
                for finding in check_consistency(&dataset) {
                    warn!("dataset inconsistency: {}", finding);
                }
                LoadState::Ready(Arc::new(dataset))
            }
            Err(e) => {
                error!("{}", e);
                LoadState::Failed(e.to_string())
            }
        };

        let mut load = self.load.write().unwrap_or_else(PoisonError::into_inner);
        // `close` takes the same lock, so this check cannot go stale
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        *load = next;
        true
    }

    /// Stops any later load outcome from being recorded.
    pub fn close(&self) {
        let _load = self.load.write().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Page state as it travels in the query string.
#[derive(Deserialize, Debug, Default)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub tab: Option<Tab>,
    pub q: Option<String>,
    pub sort: Option<SortKey>,
    pub dir: Option<SortDirection>,
}

impl DashboardQuery {
    /// Builds the request's state: the dataset's initial year unless a
    /// listed year was asked for, then tab, search and sort as given.
    pub fn into_state(self, years: &[i32]) -> DashboardState {
        let mut state = reduce(
            DashboardState::default(),
            Action::DatasetLoaded(years.to_vec()),
            years,
        );
        if let Some(year) = self.year {
            state = reduce(state, Action::SelectYear(year), years);
        }
        if let Some(tab) = self.tab {
            state = reduce(state, Action::SelectTab(tab), years);
        }
        if let Some(q) = self.q {
            state = reduce(state, Action::Search(q), years);
        }

        let key = self.sort.unwrap_or(state.sort.key);
        let direction = match (self.dir, self.sort) {
            (Some(dir), _) => dir,
            (None, Some(key)) => key.default_direction(),
            (None, None) => state.sort.direction,
        };
        state.sort = SortState::new(key, direction);

        state
    }
}

#[derive(Serialize)]
struct ApiError {
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct DepartmentsResponse<'a> {
    year: i32,
    query: &'a str,
    sort: SortState,
    rows: &'a [DepartmentRow],
    totals: Totals,
}

pub fn router(state: Arc<AppState>, public_dir: &Path) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/dataset", get(get_dataset))
        .route("/api/departments", get(get_departments))
        .route("/api/consistency", get(get_consistency))
        .route("/export/departments.csv", get(export_csv))
        .route("/export/departments.xlsx", get(export_xlsx))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]))
        .with_state(state)
}

/// Loads the dataset in the background and records the outcome on `state`.
pub fn spawn_dataset_load(state: Arc<AppState>, source: DataSource) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("loading dataset from {}", source);
        let result = loader::load_source(&source).await;
        if !state.finish_load(result) {
            debug!("dataset load finished after shutdown, result discarded");
        }
    })
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new());
    let app = router(state.clone(), &config.public_dir);

    let listener = TcpListener::bind(config.bind).await?;
    let local = listener.local_addr()?;
    info!("Listening on http://{}", local);

    let source = config.data_source(local)?;
    let load_task = spawn_dataset_load(state.clone(), source);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.close();
    load_task.abort();
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn dataset_unavailable(load: &LoadState) -> Response {
    let (code, message) = match load {
        LoadState::Loading => (StatusCode::SERVICE_UNAVAILABLE, render::LOADING_TEXT.to_string()),
        LoadState::Failed(message) => (StatusCode::BAD_GATEWAY, message.clone()),
        LoadState::Ready(_) => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    };

    (
        code,
        Json(ApiError {
            status: "error",
            message,
        }),
    )
        .into_response()
}

/// Resolves the request's state and department view, or the response to
/// send when the dataset is not available.
fn current_view(
    state: &AppState,
    params: DashboardQuery,
) -> Result<(DashboardState, i32, DepartmentView), Response> {
    let load = state.snapshot();
    let dataset = match &load {
        LoadState::Ready(dataset) => dataset.clone(),
        other => return Err(dataset_unavailable(other)),
    };

    let ui = params.into_state(&dataset.available_years());
    let Some(record) = selected_record(&dataset, ui.year) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                status: "error",
                message: render::NO_DATA_TEXT.to_string(),
            }),
        )
            .into_response());
    };

    let year = record.year;
    let view = table::view(&record.by_department, &ui.query, ui.sort);
    Ok((ui, year, view))
}

async fn serve_dashboard(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let load = state.snapshot();
    let years = match &load {
        LoadState::Ready(dataset) => dataset.available_years(),
        _ => Vec::new(),
    };
    let ui = params.into_state(&years);

    match render::render_page(load.page_data(), &ui) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("page render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "render error").into_response()
        }
    }
}

async fn get_dataset(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshot() {
        LoadState::Ready(dataset) => Json(dataset.as_ref()).into_response(),
        other => dataset_unavailable(&other),
    }
}

async fn get_departments(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match current_view(&state, params) {
        Ok((ui, year, view)) => Json(DepartmentsResponse {
            year,
            query: &ui.query,
            sort: ui.sort,
            rows: &view.rows,
            totals: view.totals,
        })
        .into_response(),
        Err(response) => response,
    }
}

async fn get_consistency(State(state): State<Arc<AppState>>) -> Response {
    match state.snapshot() {
        LoadState::Ready(dataset) => Json(check_consistency(&dataset)).into_response(),
        other => dataset_unavailable(&other),
    }
}

fn attachment(content_type: &'static str, filename: String, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn export_csv(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match current_view(&state, params) {
        Ok((_, year, view)) => attachment(
            "text/csv; charset=utf-8",
            format!("departments_{}.csv", year),
            downloader::to_csv(&view).into_bytes(),
        ),
        Err(response) => response,
    }
}

async fn export_xlsx(
    Query(params): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match current_view(&state, params) {
        Ok((_, year, view)) => match downloader::to_xlsx(&view, year) {
            Ok(bytes) => attachment(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                format!("departments_{}.xlsx", year),
                bytes,
            ),
            Err(e) => {
                error!("xlsx export failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError {
                        status: "error",
                        message: e.to_string(),
                    }),
                )
                    .into_response()
            }
        },
        Err(response) => response,
    }
}
