use axum::{
	Json, Router,
	extract::{Path, Query, State, rejection::JsonRejection},
	http::{HeaderValue, StatusCode, header},
	middleware,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use pulse_service::{
	InitialRequest, RefreshRequest, RunReport, ServiceError, TermListing, TermUpdate,
};
use pulse_storage::models::GrowthRate;

use crate::state::AppState;

const SUCCESS: &str = "Success";
const FAILURE: &str = "Failure";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/trends/{topic}", get(list_terms).put(replace_terms))
		.route("/initial", get(news_initial))
		.route("/initial/{topic}", post(trends_initial))
		.route("/latest", get(news_latest))
		.route("/latest/trends", get(trends_latest))
		.route("/all/{topic}", post(trends_all))
		.route("/refresh/{topic}", post(trends_refresh))
		.route("/growth_rates", get(growth_rates))
		.layer(middleware::map_response(allow_any_origin))
		.with_state(state)
}

/// Query of the legacy GET triggers. `topic_plural` is accepted and unused.
#[derive(Debug, Deserialize)]
pub struct LegacyParams {
	pub topic_singular: Option<String>,
	pub topic_plural: Option<String>,
}
impl LegacyParams {
	fn qualifier(&self) -> Result<&str, ApiError> {
		self.topic_singular
			.as_deref()
			.filter(|value| !value.trim().is_empty())
			.ok_or_else(|| ApiError::bad_request("topic_singular is required."))
	}
}

#[derive(Debug, Serialize)]
struct Success<T> {
	result: &'static str,
	#[serde(flatten)]
	body: T,
}
impl<T> Success<T> {
	fn new(body: T) -> Json<Self> {
		Json(Self { result: SUCCESS, body })
	}
}

#[derive(Debug, Serialize)]
struct GrowthBody {
	rows: Vec<GrowthRate>,
}

#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Serialize)]
struct ErrorBody {
	result: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn bad_request(message: impl Into<String>) -> Self {
		Self { status: StatusCode::BAD_REQUEST, message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match err {
			ServiceError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		if status.is_server_error() {
			tracing::error!(error = %err, "Request failed.");
		} else {
			tracing::warn!(error = %err, "Request rejected.");
		}

		Self { status, message: err.to_string() }
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::bad_request(rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { result: FAILURE, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

async fn allow_any_origin(mut response: Response) -> Response {
	response
		.headers_mut()
		.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

	response
}

async fn health() -> Json<Success<Empty>> {
	Success::new(Empty {})
}

async fn list_terms(
	State(state): State<AppState>,
	Path(topic): Path<String>,
) -> Result<Json<Success<TermListing>>, ApiError> {
	let listing = state.service.list_terms(&topic).await?;

	Ok(Success::new(listing))
}

async fn replace_terms(
	State(state): State<AppState>,
	Path(topic): Path<String>,
	payload: Result<Json<TermUpdate>, JsonRejection>,
) -> Result<Json<Success<TermListing>>, ApiError> {
	let Json(update) = payload?;
	let listing = state.service.replace_terms(&topic, update).await?;

	Ok(Success::new(listing))
}

async fn news_initial(
	State(state): State<AppState>,
	Query(params): Query<LegacyParams>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let report = state.service.news_initial(params.qualifier()?).await?;

	Ok(Success::new(report))
}

async fn news_latest(
	State(state): State<AppState>,
	Query(params): Query<LegacyParams>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let report = state.service.news_latest(params.qualifier()?).await?;

	Ok(Success::new(report))
}

async fn trends_latest(
	State(state): State<AppState>,
	Query(params): Query<LegacyParams>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let report = state.service.trends_latest(params.qualifier()?).await?;

	Ok(Success::new(report))
}

async fn trends_initial(
	State(state): State<AppState>,
	Path(topic): Path<String>,
	payload: Result<Json<InitialRequest>, JsonRejection>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let Json(req) = payload?;
	let report = state.service.trends_initial(&topic, req).await?;

	Ok(Success::new(report))
}

async fn trends_all(
	State(state): State<AppState>,
	Path(topic): Path<String>,
	payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let Json(req) = payload?;
	let report = state.service.trends_all(&topic, req).await?;

	Ok(Success::new(report))
}

async fn trends_refresh(
	State(state): State<AppState>,
	Path(topic): Path<String>,
	payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<Success<RunReport>>, ApiError> {
	let Json(req) = payload?;
	let report = state.service.trends_refresh(&topic, req).await?;

	Ok(Success::new(report))
}

async fn growth_rates(
	State(state): State<AppState>,
) -> Result<Json<Success<GrowthBody>>, ApiError> {
	let rows = state.service.growth_rates().await?;

	Ok(Success::new(GrowthBody { rows }))
}
