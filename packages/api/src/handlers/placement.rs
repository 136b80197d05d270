//! Stateless placement endpoints: compute a layout without storing it.
//! They need no account, since nothing is read from or written to a project.
//! The grid scan runs on the blocking pool.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use store::placement::{place_antennas, place_beacons, AntennaParams, BeaconParams};
use store::{AntennaPlacement, Barrier, Beacon, Extent, MapAreas, MapData, PlacementError, Store};
use tokio::task;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconRequest {
    pub map_width_meters: f64,
    pub map_height_meters: f64,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub rssi: Option<f64>,
    #[serde(default)]
    pub barriers: Vec<Barrier>,
}

#[derive(Debug, Serialize)]
pub struct BeaconResponse {
    pub beacons: Vec<Beacon>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntennaRequest {
    pub map_width_meters: f64,
    pub map_height_meters: f64,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub barriers: Vec<Barrier>,
}

pub async fn beacons<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<BeaconRequest>,
) -> ApiResult<Json<BeaconResponse>> {
    let defaults = &state.placement;
    let params = BeaconParams {
        step: req.step.unwrap_or(defaults.beacons.step),
        rssi: req.rssi.unwrap_or(defaults.beacons.rssi),
    };
    let extent = Extent::new(req.map_width_meters, req.map_height_meters);
    let limits = defaults.limits.clone();
    let beacons = task::spawn_blocking(move || {
        place_beacons(extent, params, &req.barriers, &limits)
    })
    .await
    .map_err(ApiError::internal)??;
    Ok(Json(BeaconResponse { beacons }))
}

pub async fn antennas<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<AntennaRequest>,
) -> ApiResult<Json<AntennaPlacement>> {
    let defaults = &state.placement;
    let params = AntennaParams {
        height: req.height.unwrap_or(defaults.antennas.height),
        angle: req.angle.unwrap_or(defaults.antennas.angle),
    };
    let extent = Extent::new(req.map_width_meters, req.map_height_meters);
    let limits = defaults.limits.clone();
    let placed = task::spawn_blocking(move || {
        place_antennas(extent, params, &req.barriers, &limits)
    })
    .await
    .map_err(ApiError::internal)??;
    Ok(Json(placed))
}

pub async fn areas(ApiJson(map): ApiJson<MapData>) -> ApiResult<Json<MapAreas>> {
    let extent = map.extent();
    if !extent.is_valid() {
        return Err(PlacementError::InvalidExtent {
            width: extent.width,
            height: extent.height,
        }
        .into());
    }
    Ok(Json(MapAreas::of(&map)))
}
