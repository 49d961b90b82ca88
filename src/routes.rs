use axum::{Json, Router, extract::{Query, State}, http::{header, StatusCode}, response::{IntoResponse, Response}, routing::{get, post, put}};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    catalog::Catalog,
    config::AppConfig,
    models::{EditCodeRequest, EditSpecRequest, EmbedQuery, EmbedResponse, Example, PipelineSnapshot, SelectExampleRequest, SpecSaveResponse, SubmitVideoRequest},
    pipeline::SpecEdit,
    session::SessionController,
    video::{embed_url, youtube_video_id},
};

/// Generated apps run in an opaque origin with scripts and nothing else.
const SANDBOX_CSP: &str = "sandbox allow-scripts";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionController>,
    pub catalog: Arc<Catalog>,
    pub config: Arc<AppConfig>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/examples", get(list_examples))
        .route("/api/session", get(get_session))
        .route("/api/session/video", post(submit_video))
        .route("/api/session/example", post(select_example))
        .route("/api/session/spec", put(edit_spec))
        .route("/api/session/code", put(edit_code))
        .route("/api/session/app", get(render_app))
        .route("/api/video/embed", get(embed_video))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "configured": state.config.api_key.is_some(),
        "model": state.config.model,
        "runs": state.session.run_count(),
        "busy": state.session.is_busy(),
    }))
}

pub async fn list_examples(State(state): State<AppState>) -> Json<Vec<Example>> {
    Json(state.catalog.examples().to_vec())
}

pub async fn get_session(State(state): State<AppState>) -> Response {
    match state.session.snapshot() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn submit_video(State(state): State<AppState>, Json(body): Json<SubmitVideoRequest>) -> ApiResult<PipelineSnapshot> {
    let orchestrator = state.session.submit_url(&body.url).map_err(|e| {
        tracing::warn!("Rejected video URL: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    let snapshot = orchestrator.snapshot();
    SessionController::launch(orchestrator);
    Ok(Json(snapshot))
}

pub async fn select_example(State(state): State<AppState>, Json(body): Json<SelectExampleRequest>) -> ApiResult<PipelineSnapshot> {
    let example = state.catalog.get(body.index)
        .ok_or((StatusCode::NOT_FOUND, format!("no example at index {}", body.index)))?;
    let orchestrator = state.session.select_example(example);
    Ok(Json(orchestrator.snapshot()))
}

pub async fn edit_spec(State(state): State<AppState>, Json(body): Json<EditSpecRequest>) -> ApiResult<SpecSaveResponse> {
    let orchestrator = state.session.current()
        .ok_or((StatusCode::CONFLICT, "no active run".to_string()))?;

    let regenerating = match orchestrator.begin_spec_edit(&body.spec) {
        SpecEdit::Unchanged => {
            tracing::info!("Spec unchanged, keeping current code");
            false
        }
        SpecEdit::Busy => return Err((StatusCode::CONFLICT, "a generation is already in progress".into())),
        SpecEdit::Accepted(spec) => {
            let task = orchestrator.clone();
            tokio::spawn(async move { task.regenerate_code(spec).await });
            true
        }
    };
    Ok(Json(SpecSaveResponse { regenerating, snapshot: orchestrator.snapshot() }))
}

pub async fn edit_code(State(state): State<AppState>, Json(body): Json<EditCodeRequest>) -> ApiResult<PipelineSnapshot> {
    let orchestrator = state.session.current()
        .ok_or((StatusCode::CONFLICT, "no active run".to_string()))?;
    orchestrator.edit_code(body.code);
    Ok(Json(orchestrator.snapshot()))
}

pub async fn render_app(State(state): State<AppState>) -> Response {
    let code = state.session.current().map(|o| o.code()).unwrap_or_default();
    if code.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_SECURITY_POLICY, SANDBOX_CSP),
        ],
        code,
    )
        .into_response()
}

pub async fn embed_video(Query(query): Query<EmbedQuery>) -> ApiResult<EmbedResponse> {
    let video_id = youtube_video_id(&query.url)
        .ok_or((StatusCode::BAD_REQUEST, format!("Not a YouTube video URL: {}", query.url)))?;
    Ok(Json(EmbedResponse { embed_url: embed_url(&video_id), video_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;
    use crate::testing::{code_reply, spec_reply, ScriptedGenerator};
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn state(gen: &Arc<ScriptedGenerator>) -> AppState {
        AppState {
            session: Arc::new(SessionController::new(gen.clone(), "test-model")),
            catalog: Arc::new(Catalog::bundled().unwrap()),
            config: Arc::new(AppConfig::default()),
        }
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_pipeline() {
        let gen = ScriptedGenerator::new();
        let app = router(state(&gen));

        let resp = app.clone()
            .oneshot(json_request("POST", "/api/session/video", json!({"url": "https://vimeo.com/1"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.oneshot(get_request("/api/session")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn example_then_sandboxed_render_and_code_edit() {
        let gen = ScriptedGenerator::new();
        let app = router(state(&gen));

        let resp = app.clone()
            .oneshot(json_request("POST", "/api/session/example", json!({"index": 0})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["phase"], json!("ready"));

        let resp = app.clone().oneshot(get_request("/api/session/app")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_SECURITY_POLICY], SANDBOX_CSP);

        let resp = app
            .oneshot(json_request("PUT", "/api/session/code", json!({"code": "<!DOCTYPE html>mine"})))
            .await
            .unwrap();
        let snap = body_json(resp).await;
        assert_eq!(snap["code"], json!("<!DOCTYPE html>mine"));
        assert_eq!(snap["code_updated"], json!(true));
        assert_eq!(snap["phase"], json!("ready"));
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_example_and_edit_without_run() {
        let gen = ScriptedGenerator::new();
        let app = router(state(&gen));

        let resp = app.clone()
            .oneshot(json_request("POST", "/api/session/example", json!({"index": 99})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(json_request("PUT", "/api/session/spec", json!({"spec": "x"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn video_submission_runs_in_background() {
        let gen = ScriptedGenerator::new();
        gen.reply(spec_reply("S1"));
        gen.reply(code_reply("CODE1</html>"));
        let state = state(&gen);
        let app = router(state.clone());

        let resp = app.clone()
            .oneshot(json_request("POST", "/api/session/video", json!({"url": "https://youtu.be/dQw4w9WgXcQ"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let snap = body_json(resp).await;
        assert_eq!(snap["phase"], json!("loading-spec"));
        assert_eq!(snap["busy"], json!(true));

        while state.session.is_busy() {
            tokio::task::yield_now().await;
        }
        let snap = state.session.snapshot().unwrap();
        assert_eq!(snap.phase, Phase::Ready);
        assert_eq!(snap.code, "<!DOCTYPE html>CODE1</html>");
    }

    #[tokio::test]
    async fn spec_save_regenerates_in_background() {
        let gen = ScriptedGenerator::new();
        gen.reply(code_reply("EDITED</html>"));
        let state = state(&gen);
        let app = router(state.clone());

        app.clone()
            .oneshot(json_request("POST", "/api/session/example", json!({"index": 0})))
            .await
            .unwrap();
        let resp = app
            .oneshot(json_request("PUT", "/api/session/spec", json!({"spec": "A brand new spec"})))
            .await
            .unwrap();
        let snap = body_json(resp).await;
        assert_eq!(snap["regenerating"], json!(true));
        assert_eq!(snap["phase"], json!("loading-code"));
        assert_eq!(snap["spec"], json!("A brand new spec"));

        while state.session.is_busy() {
            tokio::task::yield_now().await;
        }
        assert_eq!(state.session.current().unwrap().code(), "<!DOCTYPE html>EDITED</html>");
    }

    #[tokio::test]
    async fn unchanged_spec_save_reports_no_regeneration() {
        let gen = ScriptedGenerator::new();
        let state = state(&gen);
        let app = router(state.clone());

        app.clone()
            .oneshot(json_request("POST", "/api/session/example", json!({"index": 0})))
            .await
            .unwrap();
        let spec = state.session.current().unwrap().spec();
        let resp = app
            .oneshot(json_request("PUT", "/api/session/spec", json!({"spec": spec})))
            .await
            .unwrap();
        let snap = body_json(resp).await;
        assert_eq!(snap["regenerating"], json!(false));
        assert_eq!(snap["phase"], json!("ready"));
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn embed_helper() {
        let app = router(state(&ScriptedGenerator::new()));
        let resp = app
            .oneshot(get_request("/api/video/embed?url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["embed_url"], json!("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    }
}
