use crate::config::AppConfig;
use crate::data::{DataStore, SelectorOptions};
use crate::error::SelectionError;
use crate::pipeline::{render, RenderOutput};
use crate::types::FilterSelection;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

pub struct AppState {
    pub store: DataStore,
    pub config: AppConfig,
}

/// `/api/render` parameters; missing state or category means `All`.
#[derive(Debug, Deserialize)]
pub struct RenderParams {
    view: String,
    state: Option<String>,
    category: Option<String>,
}

impl RenderParams {
    pub fn selection(&self) -> Result<FilterSelection, SelectionError> {
        let view = self.view.parse()?;
        Ok(FilterSelection::new(
            view,
            self.state.as_deref().unwrap_or(""),
            self.category.as_deref().unwrap_or(""),
        ))
    }
}

pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<SelectionError> for ApiError {
    fn from(e: SelectionError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<SelectionError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Render failed: {:#}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, format!("{:#}", self.0)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/options", get(options_handler))
        .route("/api/render", get(render_handler));

    if let Some(dir) = &state.config.server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: AppConfig, store: DataStore) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState { store, config });
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn options_handler(State(state): State<Arc<AppState>>) -> Json<SelectorOptions> {
    Json(state.store.options())
}

async fn render_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RenderParams>,
) -> Result<Json<RenderOutput>, ApiError> {
    let selection = params.selection()?;
    let output = render(&state.store, &selection, &state.config.map)?;
    Ok(Json(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Selector, View};

    #[test]
    fn params_default_to_all() {
        let params = RenderParams { view: "status".into(), state: None, category: None };
        let selection = params.selection().unwrap();
        assert_eq!(selection.view, View::Status);
        assert_eq!(selection.state, Selector::All);
        assert_eq!(selection.category, Selector::All);
    }

    #[test]
    fn params_carry_state_and_category() {
        let params = RenderParams {
            view: "proximity".into(),
            state: Some("Lagos".into()),
            category: Some("Bank branch".into()),
        };
        let selection = params.selection().unwrap();
        assert_eq!(selection.state, Selector::Only("Lagos".to_string()));
        assert_eq!(selection.category, Selector::Only("Bank branch".to_string()));
    }

    #[test]
    fn unknown_view_is_a_bad_request() {
        let params = RenderParams { view: "pie".into(), state: None, category: None };
        let err = ApiError::from(params.selection().unwrap_err());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
