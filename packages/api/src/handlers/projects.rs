//! Project CRUD, always scoped to the authenticated owner.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use store::placement::{AntennaParams, BeaconParams};
use store::{
    apply_auto_placement, AutoPlacement, NewProject, PlacementDefaults, Project, ProjectUpdate,
    Store,
};
use tokio::task;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;

/// Ids that are not UUIDs cannot name a stored project.
fn project_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Project"))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list(auth.id).await?))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = project_id(&id)?;
    Ok(Json(state.projects.get(auth.id, id).await?))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    ApiJson(new): ApiJson<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.projects.create(auth.id, new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    let id = project_id(&id)?;
    Ok(Json(state.projects.update(auth.id, id, update).await?))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = project_id(&id)?;
    state.projects.delete(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Which devices to regenerate; omitted parameters fall back to the
/// configured placement defaults.
#[derive(Debug, Deserialize)]
#[serde(tag = "devices", rename_all = "lowercase")]
pub enum AutoPlaceRequest {
    Beacons {
        #[serde(default)]
        step: Option<f64>,
        #[serde(default)]
        rssi: Option<f64>,
    },
    Antennas {
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        angle: Option<f64>,
    },
}

impl AutoPlaceRequest {
    fn resolve(self, defaults: &PlacementDefaults) -> AutoPlacement {
        match self {
            AutoPlaceRequest::Beacons { step, rssi } => AutoPlacement::Beacons(BeaconParams {
                step: step.unwrap_or(defaults.beacons.step),
                rssi: rssi.unwrap_or(defaults.beacons.rssi),
            }),
            AutoPlaceRequest::Antennas { height, angle } => AutoPlacement::Antennas(AntennaParams {
                height: height.unwrap_or(defaults.antennas.height),
                angle: angle.unwrap_or(defaults.antennas.angle),
            }),
        }
    }
}

pub async fn auto_place<S: Store>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AutoPlaceRequest>,
) -> ApiResult<Json<Project>> {
    let id = project_id(&id)?;
    let placement = req.resolve(&state.placement);
    let mut project = state.projects.get(auth.id, id).await?;
    let limits = state.projects.limits().clone();
    let project = task::spawn_blocking(move || {
        apply_auto_placement(&mut project, placement, &limits).map(|()| project)
    })
    .await
    .map_err(ApiError::internal)??;
    Ok(Json(state.projects.save_layout(auth.id, project).await?))
}
