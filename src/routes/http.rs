//! HTTP endpoint handlers. Thin wrappers over the session store and route table.

use std::sync::Arc;

use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::navigation::Route;
use crate::protocol::{HealthOut, RouteOut, RouteQuery, SessionOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let store = state.store();
  let signed_in = store.is_signed_in().await;
  let login = if signed_in { store.remembered_login().await } else { None };
  Json(SessionOut { signed_in, login })
}

/// Resolve a front-end path against the current session. Guarded routes
/// redirect to `/sign-in` while nobody is signed in.
#[instrument(level = "info", skip(state), fields(path = %q.path))]
pub async fn http_route(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RouteQuery>,
) -> impl IntoResponse {
  let Some(route) = Route::parse(&q.path) else {
    return (StatusCode::NOT_FOUND, Json(RouteOut { requested: q.path, path: String::new(), redirected: false }));
  };
  let resolved = route.resolve(state.store().is_signed_in().await);
  let redirected = resolved != route;
  info!(target: "session", requested = %route, resolved = %resolved, redirected, "Route resolved");
  (StatusCode::OK, Json(RouteOut { requested: q.path, path: resolved.path(), redirected }))
}
