//! HTTP routes for the index and widget pages.

use std::{fmt::Display, path::Path, sync::Arc};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use widget_core::{
    Forecaster, Helpers, Renderer, ViewData,
    render::{HEAD, LAYOUT},
};

pub const INDEX: &str = "index.html";
pub const WIDGET: &str = "widget.html";
pub const WHOOPS: &str = "whoops.html";

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<Renderer>,
    pub forecaster: Arc<dyn Forecaster>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub location: String,
}

/// Builds every page the routes render.
pub fn build_renderer(templates_dir: &Path) -> widget_core::Result<Renderer> {
    let mut renderer = Renderer::new(templates_dir, Helpers::default());
    for page in [INDEX, WIDGET, WHOOPS] {
        renderer.register_template(page, &[LAYOUT, HEAD])?;
    }
    Ok(renderer)
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/weather", get(widget))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>, Query(params): Query<LocationQuery>) -> Response {
    let mut data = ViewData::new();
    data.insert("query", params.location);

    page(&state.renderer, INDEX, &data)
}

async fn widget(State(state): State<AppState>, Query(params): Query<LocationQuery>) -> Response {
    let location = params.location.trim();
    if location.is_empty() {
        return whoops(&state.renderer, StatusCode::BAD_REQUEST, &"must specify location");
    }

    let conditions = match state.forecaster.forecast(location).await {
        Ok(conditions) => conditions,
        Err(err) => {
            tracing::warn!(location, error = %err, "forecast failed");
            return whoops(&state.renderer, StatusCode::INTERNAL_SERVER_ERROR, &err);
        }
    };

    page(&state.renderer, WIDGET, &ViewData::from_conditions(&conditions, location))
}

/// Renders into a buffer so a failed render never leaks a half page.
fn page(renderer: &Renderer, name: &str, data: &ViewData) -> Response {
    let mut body = Vec::new();
    match renderer.render(&mut body, name, data) {
        Ok(()) => Html(body).into_response(),
        Err(err) => {
            tracing::error!(template = name, error = %err, "render failed");
            whoops(renderer, StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    }
}

fn whoops(renderer: &Renderer, status: StatusCode, err: &dyn Display) -> Response {
    let message = err.to_string();

    let mut data = ViewData::new();
    data.insert("error", message.as_str());

    let mut body = Vec::new();
    match renderer.render(&mut body, WHOOPS, &data) {
        Ok(()) => (status, Html(body)).into_response(),
        Err(render_err) => {
            tracing::error!(error = %render_err, "error page failed to render");
            (status, message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use widget_core::{Conditions, ProviderError, provider::mock::MockForecaster};

    fn templates_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../templates")
    }

    #[derive(Debug, Default)]
    struct CountingForecaster {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Forecaster for CountingForecaster {
        async fn forecast(&self, location: &str) -> widget_core::Result<Conditions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Conditions::new(location, 5, "Light rain"))
        }
    }

    #[derive(Debug)]
    struct FailingForecaster;

    #[async_trait]
    impl Forecaster for FailingForecaster {
        async fn forecast(&self, _: &str) -> widget_core::Result<Conditions> {
            Err(ProviderError::Api("Unable to find any matching weather location".into()).into())
        }
    }

    /// Serves the app on an ephemeral port and returns its base URL.
    async fn spawn_app(forecaster: Arc<dyn Forecaster>) -> String {
        let renderer = build_renderer(&templates_dir()).expect("shipped templates build");
        let state = AppState {
            renderer: Arc::new(renderer),
            forecaster,
        };
        let app = router(state, &Path::new(env!("CARGO_MANIFEST_DIR")).join("../public/static"));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[test]
    fn shipped_templates_build() {
        let renderer = build_renderer(&templates_dir()).unwrap();
        for page in [INDEX, WIDGET, WHOOPS] {
            assert!(renderer.is_registered(page), "{page}");
        }
    }

    #[test]
    fn shipped_templates_need_the_widget_helpers() {
        let mut renderer = Renderer::new(templates_dir(), Helpers::empty());
        let err = renderer.register_template(WIDGET, &[LAYOUT, HEAD]).unwrap_err();

        assert!(matches!(err, widget_core::Error::TemplateBuild { .. }));
    }

    #[tokio::test]
    async fn widget_shows_clothes_for_warm_weather() {
        let base = spawn_app(Arc::new(MockForecaster::with_conditions(25, "clear"))).await;

        let res = reqwest::get(format!("{base}/weather?location=Berlin")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "text/html; charset=utf-8"
        );

        let body = res.text().await.unwrap();
        assert!(body.contains("Berlin"));
        assert!(body.contains("25"));
        for item in ["hat", "sunglasses", "tshirt"] {
            assert!(body.contains(&format!("clothing {item}\"")), "missing {item}: {body}");
        }
        assert!(!body.contains("umbrella"));
        assert!(!body.contains("winterhat"));
    }

    #[tokio::test]
    async fn widget_rejects_empty_location_without_forecasting() {
        let forecaster = Arc::new(CountingForecaster::default());
        let base = spawn_app(forecaster.clone()).await;

        for url in [format!("{base}/weather"), format!("{base}/weather?location=%20")] {
            let res = reqwest::get(url).await.unwrap();
            assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
            assert!(res.text().await.unwrap().contains("must specify location"));
        }
        assert_eq!(forecaster.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn widget_passes_location_to_forecaster() {
        let forecaster = Arc::new(CountingForecaster::default());
        let base = spawn_app(forecaster.clone()).await;

        let res = reqwest::get(format!("{base}/weather?location=Oslo")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);

        let body = res.text().await.unwrap();
        assert!(body.contains("Oslo"));
        assert!(body.contains("clothing umbrella\""));
        assert_eq!(forecaster.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forecast_failure_is_server_error() {
        let base = spawn_app(Arc::new(FailingForecaster)).await;

        let res = reqwest::get(format!("{base}/weather?location=Atlantis")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        let body = res.text().await.unwrap();
        assert!(body.contains("API responded with errors: Unable to find any matching weather location"));
    }

    #[tokio::test]
    async fn index_prefills_query() {
        let base = spawn_app(Arc::new(MockForecaster::default())).await;

        let res = reqwest::get(format!("{base}/?location=Paris")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert!(res.text().await.unwrap().contains("value=\"Paris\""));

        let res = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert!(res.text().await.unwrap().contains("<form"));
    }

    #[tokio::test]
    async fn serves_static_files() {
        let base = spawn_app(Arc::new(MockForecaster::default())).await;

        let res = reqwest::get(format!("{base}/static/style.css")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn whoops_falls_back_to_plain_message() {
        let renderer = Renderer::new(templates_dir(), Helpers::default());

        let res = whoops(&renderer, StatusCode::BAD_REQUEST, &"must specify location");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"must specify location");
    }
}
