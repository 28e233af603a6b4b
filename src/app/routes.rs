use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};

use crate::app::model::{
    CompletionRequest, FontAdjust, IndexRequest, LibraryEntry, LibraryQuery, PreferencesUpdate,
    PreferencesView, VisibilityRequest,
};
use crate::app::state::AppState;
use crate::formats::{LessonDocument, LibraryItem, ReadingProgress};
use crate::library::find_series;
use crate::reader::FontSize;
use crate::session::{ReadingSession, SessionSnapshot};

/// JSON API consumed by the reader UI.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/library", get(library))
        .route("/api/lessons/:lesson_id", get(lesson))
        .route("/api/progress/:lesson_id", get(progress))
        .route("/api/preferences", get(preferences).put(update_preferences))
        .route("/api/sessions/:lesson_id", post(open_session))
        .route("/api/sessions/:lesson_id/visibility", post(visibility))
        .route("/api/sessions/:lesson_id/seek/begin", post(begin_seek))
        .route("/api/sessions/:lesson_id/seek/scrub", post(scrub))
        .route("/api/sessions/:lesson_id/seek/end", post(end_seek))
        .route("/api/sessions/:lesson_id/completion", post(completion))
        .with_state(state)
}

async fn library(
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Vec<LibraryEntry>>, StatusCode> {
    let manifest = state.library.manifest().await.map_err(|err| {
        tracing::error!(?err, "load manifest");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let items = match query.series.as_deref() {
        Some(series_id) => find_series(&manifest, series_id)
            .ok_or(StatusCode::NOT_FOUND)?
            .books
            .iter()
            .cloned()
            .map(LibraryItem::Book)
            .collect(),
        None => manifest,
    };

    let entries = state
        .progress
        .library_view(&items, query.hide_completed)
        .into_iter()
        .map(|item| LibraryEntry {
            progress_percent: state.progress.item_percent(&item),
            completed: state.progress.is_item_completed(&item),
            last_read: state.progress.most_recent_activity(&item),
            item,
        })
        .collect();
    Ok(Json(entries))
}

async fn lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonDocument>, StatusCode> {
    load_lesson(&state, &lesson_id).await.map(Json)
}

async fn progress(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<ReadingProgress>, StatusCode> {
    state
        .progress
        .get(&lesson_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn preferences(State(state): State<AppState>) -> Json<PreferencesView> {
    Json(state.preferences.load().into())
}

async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<PreferencesView>, StatusCode> {
    let mut prefs = state.preferences.load();
    if let Some(mode) = update.mode {
        prefs.mode = mode;
    }
    if let Some(px) = update.font_size {
        prefs.font_size = FontSize::new(px);
    }
    prefs.font_size = match update.adjust {
        Some(FontAdjust::Increase) => prefs.font_size.increase(),
        Some(FontAdjust::Decrease) => prefs.font_size.decrease(),
        None => prefs.font_size,
    };
    state.preferences.save(&prefs).map_err(|err| {
        tracing::error!(?err, "save preferences");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(prefs.into()))
}

async fn open_session(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    let doc = load_lesson(&state, &lesson_id).await?;
    let session = ReadingSession::open(&doc, state.progress.clone(), state.clock.clone());
    let snapshot = session.snapshot();
    state.insert_session(session).map_err(|err| {
        tracing::error!(?err, "register session");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    tracing::info!(lesson = %lesson_id, index = snapshot.active_index, "session opened");
    Ok(Json(snapshot))
}

async fn visibility(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    update_session(&state, &lesson_id, |session| {
        session.notify_visibility_changed(req.index, req.centered);
    })
}

async fn begin_seek(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    update_session(&state, &lesson_id, ReadingSession::begin_seek)
}

async fn scrub(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<IndexRequest>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    update_session(&state, &lesson_id, |session| {
        session.scrub_to(req.index);
    })
}

async fn end_seek(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<IndexRequest>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    update_session(&state, &lesson_id, |session| {
        session.end_seek(req.index);
    })
}

async fn completion(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    update_session(&state, &lesson_id, |session| {
        session.toggle_completion(req.completed);
    })
}

async fn load_lesson(state: &AppState, lesson_id: &str) -> Result<LessonDocument, StatusCode> {
    state
        .library
        .lesson(lesson_id)
        .await
        .map_err(|err| {
            tracing::error!(lesson = %lesson_id, ?err, "load lesson");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)
}

fn update_session(
    state: &AppState,
    lesson_id: &str,
    f: impl FnOnce(&mut ReadingSession),
) -> Result<Json<SessionSnapshot>, StatusCode> {
    state
        .with_session(lesson_id, |session| {
            f(session);
            session.snapshot()
        })
        .map_err(|err| {
            tracing::error!(lesson = %lesson_id, ?err, "update session");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt as _;

    use super::*;
    use crate::library::{DirLibrary, WithDemoFallback};
    use crate::progress::{MemoryStore, ProgressStore};
    use crate::reader::PreferenceStore;
    use crate::session::Clock;

    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now_millis(&self) -> i64 {
            self.0.fetch_add(10, Ordering::SeqCst)
        }
    }

    fn demo_state() -> AppState {
        let library = WithDemoFallback::new(DirLibrary::new("/nonexistent/zenreader-library"));
        let kv = Arc::new(MemoryStore::new());
        AppState::new(
            Arc::new(library),
            ProgressStore::new(kv.clone()),
            PreferenceStore::new(kv),
            Arc::new(StepClock(AtomicI64::new(1_000))),
        )
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        let resp = router.clone().oneshot(builder.body(body)?).await?;
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        Ok((status, value))
    }

    #[tokio::test]
    async fn session_flow_persists_through_the_api() -> anyhow::Result<()> {
        let state = demo_state();
        let router = api_router(state.clone());

        let (status, snap) = call(&router, Method::POST, "/api/sessions/ep-001", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["activeIndex"], 0);
        assert_eq!(snap["totalSegments"], 5);

        let (_, snap) = call(
            &router,
            Method::POST,
            "/api/sessions/ep-001/visibility",
            Some(serde_json::json!({"index": 3, "centered": true})),
        )
        .await?;
        assert_eq!(snap["activeIndex"], 3);
        assert_eq!(snap["progressPercent"], 80);

        call(&router, Method::POST, "/api/sessions/ep-001/seek/begin", None).await?;
        let (_, snap) = call(
            &router,
            Method::POST,
            "/api/sessions/ep-001/visibility",
            Some(serde_json::json!({"index": 0, "centered": true})),
        )
        .await?;
        assert_eq!(snap["mode"], "seeking");
        assert_eq!(snap["activeIndex"], 3);

        let (_, snap) = call(
            &router,
            Method::POST,
            "/api/sessions/ep-001/seek/end",
            Some(serde_json::json!({"index": 1})),
        )
        .await?;
        assert_eq!(snap["mode"], "watching");

        let (status, record) = call(&router, Method::GET, "/api/progress/ep-001", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["segmentIndex"], 1);
        assert_eq!(record["isCompleted"], false);
        Ok(())
    }

    #[tokio::test]
    async fn library_lists_recent_first_with_progress() -> anyhow::Result<()> {
        let state = demo_state();
        let router = api_router(state.clone());

        call(&router, Method::POST, "/api/sessions/demo-steve-jobs", None).await?;
        call(
            &router,
            Method::POST,
            "/api/sessions/demo-steve-jobs/completion",
            Some(serde_json::json!({"completed": true})),
        )
        .await?;

        let (status, entries) = call(&router, Method::GET, "/api/library", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entries[0]["id"], "demo-steve-jobs");
        assert_eq!(entries[0]["type"], "book");
        assert_eq!(entries[0]["progressPercent"], 100);
        assert_eq!(entries[0]["completed"], true);
        assert_eq!(entries[1]["type"], "series");
        assert_eq!(entries[1]["lastRead"], 0);

        let (_, entries) =
            call(&router, Method::GET, "/api/library?hide_completed=true", None).await?;
        assert_eq!(entries.as_array().map(Vec::len), Some(1));

        let (status, entries) = call(
            &router,
            Method::GET,
            "/api/library?series=series-english-pod",
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entries.as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_lessons_and_sessions_are_not_found() -> anyhow::Result<()> {
        let router = api_router(demo_state());

        let (status, _) = call(&router, Method::GET, "/api/lessons/nope", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&router, Method::POST, "/api/sessions/nope", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) =
            call(&router, Method::POST, "/api/sessions/ep-002/seek/begin", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&router, Method::GET, "/api/progress/ep-002", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn preferences_update_and_clamp() -> anyhow::Result<()> {
        let router = api_router(demo_state());

        let (status, prefs) = call(&router, Method::GET, "/api/preferences", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prefs["mode"], "bi");
        assert_eq!(prefs["fontSize"], 18);
        assert_eq!(prefs["secondaryFontSize"], 16);

        let (status, prefs) = call(
            &router,
            Method::PUT,
            "/api/preferences",
            Some(serde_json::json!({"mode": "cn", "adjust": "increase"})),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prefs["mode"], "cn");
        assert_eq!(prefs["fontSize"], 20);

        let (_, prefs) = call(
            &router,
            Method::PUT,
            "/api/preferences",
            Some(serde_json::json!({"fontSize": 40, "adjust": "decrease"})),
        )
        .await?;
        assert_eq!(prefs["fontSize"], 30);
        assert_eq!(prefs["secondaryFontSize"], 28);

        let (_, prefs) = call(&router, Method::GET, "/api/preferences", None).await?;
        assert_eq!(prefs["mode"], "cn");
        assert_eq!(prefs["fontSize"], 30);
        Ok(())
    }
}
