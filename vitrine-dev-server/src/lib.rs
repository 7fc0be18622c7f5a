use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, trace::TraceLayer};
use vitrine_core::{
    AssetManifest, Commit, ComposeError, PageComposer, Preview, PreviewSession, Project,
    RenderTicket, normalize,
};

/// Header a client may send with `POST /api/preview`; echoed on the response
/// so the client can drop responses that arrive out of order.
pub const RENDER_SEQ_HEADER: &str = "x-render-seq";

const RELOAD: &str = "reload";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Render failed: {0}")]
    Compose(#[from] ComposeError),
    #[error("No preview has been rendered yet")]
    NotRendered,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Compose(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotRendered => StatusCode::NOT_FOUND,
            Self::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Shared render state: the composer, the displayed preview and the reload
/// channel connected browsers listen on.
#[derive(Clone)]
pub struct PreviewHub {
    composer: Arc<PageComposer>,
    session: Arc<PreviewSession>,
    reload_tx: broadcast::Sender<String>,
}

impl PreviewHub {
    pub fn new(composer: PageComposer) -> Self {
        let (reload_tx, _) = broadcast::channel(100);
        Self {
            composer: Arc::new(composer),
            session: Arc::new(PreviewSession::new()),
            reload_tx,
        }
    }

    pub fn composer(&self) -> &PageComposer {
        &self.composer
    }

    /// Reserve a ticket for a render about to start.
    pub fn begin(&self) -> RenderTicket {
        self.session.begin()
    }

    /// Render `project` off the async runtime and display it unless a newer
    /// render was requested in the meantime.
    pub async fn render(&self, ticket: RenderTicket, project: Project) -> Result<Commit, ApiError> {
        let preview = self.compose_preview(project).await?;
        let outcome = self.session.commit(ticket, preview);
        if outcome == Commit::Applied {
            tracing::debug!(ticket = ticket.sequence(), "preview updated");
            // No subscribers is fine.
            let _ = self.reload_tx.send(RELOAD.to_string());
        }
        Ok(outcome)
    }

    pub async fn publish(&self, project: Project) -> Result<Commit, ApiError> {
        let ticket = self.begin();
        self.render(ticket, project).await
    }

    pub fn current(&self) -> Option<Preview> {
        self.session.current()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.reload_tx.subscribe()
    }

    async fn compose_preview(&self, project: Project) -> Result<Preview, ApiError> {
        let composer = Arc::clone(&self.composer);
        tokio::task::spawn_blocking(move || composer.preview(&project))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}

/// Routes for the preview server. Files under `assets`, when given, are served
/// for any path no route claims.
pub fn router(hub: PreviewHub, assets: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/", get(host_handler))
        .route("/preview", get(preview_handler))
        .route("/__livereload", get(websocket_handler))
        .route("/api/preview", post(api_preview_handler))
        .route("/api/export", post(api_export_handler))
        .with_state(hub);

    match assets {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

/// Configuration for the preview server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Local images referenced by relative path
    pub assets: Option<PathBuf>,
    /// Auto-open browser
    pub open: bool,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            assets: None,
            open: false,
        }
    }
}

pub struct LiveServer {
    config: LiveServerConfig,
    hub: PreviewHub,
}

impl LiveServer {
    pub fn new(config: LiveServerConfig, hub: PreviewHub) -> Self {
        Self { config, hub }
    }

    pub async fn run(self) -> Result<()> {
        let assets = self.config.assets.filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                tracing::warn!("Assets directory does not exist: {}", dir.display());
            }
            exists
        });

        let app = router(self.hub, assets).layer(TraceLayer::new_for_http());
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Serving preview at http://{}", addr);
        tracing::info!("Live reload enabled at ws://{}/__livereload", addr);

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn host_handler(State(hub): State<PreviewHub>) -> Html<String> {
    Html(inject_livereload_script(&host_page(hub.current().as_ref())))
}

async fn preview_handler(State(hub): State<PreviewHub>) -> Result<Html<String>, ApiError> {
    hub.current()
        .map(|preview| Html(preview.html().to_string()))
        .ok_or(ApiError::NotRendered)
}

async fn api_preview_handler(
    State(hub): State<PreviewHub>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Response, ApiError> {
    let seq = headers
        .get(RENDER_SEQ_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    let preview = hub.compose_preview(normalize(&raw)).await?;

    let mut response = Html(preview.html().to_string()).into_response();
    if let Some(seq) = seq {
        response
            .headers_mut()
            .insert(RENDER_SEQ_HEADER, HeaderValue::from(seq));
    }
    Ok(response)
}

#[derive(Serialize)]
struct ExportResponse {
    html: String,
    manifest: AssetManifest,
}

async fn api_export_handler(
    State(hub): State<PreviewHub>,
    Json(raw): Json<Value>,
) -> Result<Json<ExportResponse>, ApiError> {
    let project = normalize(&raw);
    let composer = Arc::clone(&hub.composer);
    let bundle = tokio::task::spawn_blocking(move || composer.bundle(&project))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    tracing::info!(
        assets = bundle.manifest().assets.len(),
        hash = %bundle.manifest().content_hash,
        "exported bundle"
    );
    Ok(Json(ExportResponse {
        html: bundle.index_html().to_string(),
        manifest: bundle.manifest().clone(),
    }))
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(hub): State<PreviewHub>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_connection(socket, hub.subscribe()))
}

async fn websocket_connection(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    if socket
        .send(Message::Text("connected".to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(reload_msg) => {
                        if socket.send(Message::Text(reload_msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

/// Page that frames the preview. The preview itself goes in `srcdoc`
/// untouched.
pub fn host_page(preview: Option<&Preview>) -> String {
    let frame = match preview {
        Some(preview) => format!(
            "<iframe class=\"vt-preview-frame\" title=\"Preview\" srcdoc=\"{}\"></iframe>",
            preview.srcdoc()
        ),
        None => "<p class=\"vt-preview-pending\">Waiting for the first render&hellip;</p>"
            .to_string(),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Vitrine preview</title>\n<style>html,body{{margin:0;height:100%}}.vt-preview-frame{{border:0;width:100%;height:100%;display:block}}</style>\n</head>\n<body>\n{frame}\n</body>\n</html>\n"
    )
}

/// Inject live reload script into HTML content
pub fn inject_livereload_script(html: &str) -> String {
    let script = r#"
<script>
(function() {
    const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const socket = new WebSocket(scheme + location.host + '/__livereload');
    socket.onmessage = function(event) {
        if (event.data === 'reload') {
            location.reload();
        }
    };
    socket.onclose = function() {
        console.log('Live reload disconnected');
    };
})();
</script>
"#;

    // Try to inject before closing body tag, or at the end if not found
    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script.len());
        result.push_str(&html[..pos]);
        result.push_str(script);
        result.push_str(&html[pos..]);
        result
    } else {
        format!("{}{}", html, script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use vitrine_core::{AssetKind, RenderOptions, compose};

    fn hub() -> PreviewHub {
        PreviewHub::new(PageComposer::new(RenderOptions::default()).unwrap())
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn preview_route_serves_composed_markup_unchanged() {
        let hub = hub();
        hub.publish(Project::starter()).await.unwrap();

        let response = router(hub, None)
            .oneshot(Request::get("/preview").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert_eq!(html, compose(&Project::starter()).unwrap().as_str());
        assert!(!html.contains("__livereload"));
    }

    #[tokio::test]
    async fn preview_route_before_first_render_is_not_found() {
        let response = router(hub(), None)
            .oneshot(Request::get("/preview").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn host_page_frames_preview_and_carries_reload_script() {
        let hub = hub();
        hub.publish(Project::starter()).await.unwrap();

        let response = router(hub, None)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("srcdoc=\"&lt;!DOCTYPE html&gt;"));
        assert!(html.contains("/__livereload"));
    }

    #[tokio::test]
    async fn api_preview_echoes_render_sequence() {
        let raw = serde_json::json!({ "project": { "name": "Echo", "products": [] } });
        let mut request = post_json("/api/preview", &raw);
        request
            .headers_mut()
            .insert(RENDER_SEQ_HEADER, HeaderValue::from_static("42"));

        let response = router(hub(), None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[RENDER_SEQ_HEADER], "42");
        let html = body_string(response).await;
        assert!(html.contains("<title>Echo</title>"));
    }

    #[tokio::test]
    async fn api_export_matches_preview_markup() {
        let raw = serde_json::json!({
            "name": "Shop",
            "products": [{ "name": "Frame", "price": 120 }]
        });

        let preview = router(hub(), None)
            .oneshot(post_json("/api/preview", &raw))
            .await
            .unwrap();
        let preview_html = body_string(preview).await;

        let export = router(hub(), None)
            .oneshot(post_json("/api/export", &raw))
            .await
            .unwrap();
        assert_eq!(export.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(export).await).unwrap();

        assert_eq!(body["html"].as_str().unwrap(), preview_html);
        assert_eq!(body["manifest"]["entry"], "index.html");
        let manifest: AssetManifest = serde_json::from_value(body["manifest"].clone()).unwrap();
        assert!(manifest.assets.iter().all(|a| a.kind == AssetKind::Placeholder));
    }

    #[tokio::test]
    async fn superseded_render_is_not_displayed() {
        let hub = hub();
        let mut rx = hub.subscribe();
        let first = hub.begin();
        let second = hub.begin();

        let newer = Project {
            name: "Newer".into(),
            ..Project::starter()
        };
        let older = Project {
            name: "Older".into(),
            ..Project::starter()
        };

        assert_eq!(hub.render(second, newer).await.unwrap(), Commit::Applied);
        assert!(matches!(
            hub.render(first, older).await.unwrap(),
            Commit::Stale { .. }
        ));

        assert!(hub.current().unwrap().html().contains("<title>Newer</title>"));
        assert_eq!(rx.recv().await.unwrap(), RELOAD);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn script_goes_before_closing_body() {
        let html = inject_livereload_script("<html><body><p>x</p></body></html>");
        let script = html.find("<script>").unwrap();
        assert!(script < html.rfind("</body>").unwrap());
        assert!(html.find("<p>x</p>").unwrap() < script);
    }
}
