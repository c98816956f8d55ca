use crate::api::response::ErrorResponse;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::collections::BTreeMap;

use super::{
    commands::{
        CreateCountryCommand, CreateCountryError, DeleteCountryCommand, DeleteCountryError,
        RefreshCountriesCommand,
    },
    queries::{
        GetCountryError, GetCountryQuery, GetStatusQuery, GetSummaryImageError,
        GetSummaryImageQuery, ListCountriesError, ListCountriesQuery, StatusError,
    },
};
use crate::features::FeatureState;
use crate::refresh::RefreshError;

pub const COUNTRY_NOT_FOUND: &str = "Country not found";
pub const SUMMARY_IMAGE_NOT_FOUND: &str = "Summary image not found";
pub const EXTERNAL_SOURCE_UNAVAILABLE: &str = "External data source unavailable";
pub const REFRESH_IN_PROGRESS: &str = "Refresh already in progress";

pub fn countries_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_countries).post(create_country))
        .route("/refresh", post(refresh_countries))
        .route("/image", get(get_summary_image))
        .route("/:name", get(get_country).delete(delete_country))
}

#[tracing::instrument(skip(state, query))]
async fn list_countries(
    State(state): State<FeatureState>,
    Query(query): Query<ListCountriesQuery>,
) -> Result<Response, CountriesApiError> {
    let countries = super::queries::list::handle(state.store, query).await?;

    tracing::debug!(count = countries.len(), "Countries listed via API");

    Ok((StatusCode::OK, Json(countries)).into_response())
}

#[tracing::instrument(skip(state, payload))]
async fn create_country(
    State(state): State<FeatureState>,
    payload: Result<Json<CreateCountryCommand>, JsonRejection>,
) -> Result<Response, CountriesApiError> {
    let Json(command) = payload?;
    let country = super::commands::create::handle(state.store, command).await?;

    tracing::info!(
        country_id = country.id,
        country_name = %country.name,
        "Country created via API"
    );

    Ok((StatusCode::CREATED, Json(country)).into_response())
}

#[tracing::instrument(skip(state), fields(name = %name))]
async fn get_country(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> Result<Response, CountriesApiError> {
    let country = super::queries::get::handle(state.store, GetCountryQuery { name }).await?;

    tracing::debug!(country_id = country.id, "Country retrieved via API");

    Ok((StatusCode::OK, Json(country)).into_response())
}

#[tracing::instrument(skip(state), fields(name = %name))]
async fn delete_country(
    State(state): State<FeatureState>,
    Path(name): Path<String>,
) -> Result<Response, CountriesApiError> {
    super::commands::delete::handle(state.store, DeleteCountryCommand { name: name.clone() })
        .await?;

    tracing::info!(country_name = %name, "Country deleted via API");

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[tracing::instrument(skip(state))]
async fn refresh_countries(State(state): State<FeatureState>) -> Result<Response, CountriesApiError> {
    let response =
        super::commands::refresh::handle(&state.engine, RefreshCountriesCommand).await?;

    tracing::info!(
        total_countries = response.total_countries,
        last_refreshed_at = %response.last_refreshed_at,
        "Countries refreshed via API"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(state))]
async fn get_summary_image(State(state): State<FeatureState>) -> Result<Response, CountriesApiError> {
    let bytes =
        super::queries::image::handle(state.engine.summary_image_path(), GetSummaryImageQuery)
            .await?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

#[tracing::instrument(skip(state))]
pub(crate) async fn get_status(State(state): State<FeatureState>) -> Result<Response, CountriesApiError> {
    let status = super::queries::status::handle(state.store, GetStatusQuery).await?;

    Ok((StatusCode::OK, Json(status)).into_response())
}

#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub(crate) enum CountriesApiError {
    InvalidBody(JsonRejection),
    CreateError(CreateCountryError),
    DeleteError(DeleteCountryError),
    GetError(GetCountryError),
    ListError(ListCountriesError),
    RefreshError(RefreshError),
    ImageError(GetSummaryImageError),
    StatusError(StatusError),
}

impl From<JsonRejection> for CountriesApiError {
    fn from(err: JsonRejection) -> Self {
        Self::InvalidBody(err)
    }
}

impl From<CreateCountryError> for CountriesApiError {
    fn from(err: CreateCountryError) -> Self {
        Self::CreateError(err)
    }
}

impl From<DeleteCountryError> for CountriesApiError {
    fn from(err: DeleteCountryError) -> Self {
        Self::DeleteError(err)
    }
}

impl From<GetCountryError> for CountriesApiError {
    fn from(err: GetCountryError) -> Self {
        Self::GetError(err)
    }
}

impl From<ListCountriesError> for CountriesApiError {
    fn from(err: ListCountriesError) -> Self {
        Self::ListError(err)
    }
}

impl From<RefreshError> for CountriesApiError {
    fn from(err: RefreshError) -> Self {
        Self::RefreshError(err)
    }
}

impl From<GetSummaryImageError> for CountriesApiError {
    fn from(err: GetSummaryImageError) -> Self {
        Self::ImageError(err)
    }
}

impl From<StatusError> for CountriesApiError {
    fn from(err: StatusError) -> Self {
        Self::StatusError(err)
    }
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for CountriesApiError {
    fn into_response(self) -> Response {
        match self {
            CountriesApiError::InvalidBody(rejection) => {
                let mut fields = BTreeMap::new();
                fields.insert("body".to_string(), rejection.body_text());
                ErrorResponse::validation(&fields).into_response_with(StatusCode::BAD_REQUEST)
            },

            CountriesApiError::CreateError(CreateCountryError::Validation(fields)) => {
                ErrorResponse::validation(&fields).into_response_with(StatusCode::BAD_REQUEST)
            },
            CountriesApiError::CreateError(CreateCountryError::Duplicate(name)) => {
                ErrorResponse::with_details("Country already exists", name)
                    .into_response_with(StatusCode::CONFLICT)
            },
            CountriesApiError::CreateError(err @ CreateCountryError::Store(_)) => {
                internal_error("Store error during country creation", &err)
            },

            CountriesApiError::DeleteError(DeleteCountryError::NotFound(_))
            | CountriesApiError::GetError(GetCountryError::NotFound(_)) => {
                ErrorResponse::new(COUNTRY_NOT_FOUND).into_response_with(StatusCode::NOT_FOUND)
            },
            CountriesApiError::DeleteError(err @ DeleteCountryError::Store(_)) => {
                internal_error("Store error during country deletion", &err)
            },
            CountriesApiError::GetError(err @ GetCountryError::Store(_)) => {
                internal_error("Store error during country retrieval", &err)
            },
            CountriesApiError::ListError(err) => {
                internal_error("Store error during country listing", &err)
            },

            CountriesApiError::RefreshError(RefreshError::ExternalSource(message)) => {
                tracing::warn!("Refresh aborted: {}", message);
                ErrorResponse::with_details(EXTERNAL_SOURCE_UNAVAILABLE, message)
                    .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
            },
            CountriesApiError::RefreshError(RefreshError::InProgress) => {
                ErrorResponse::new(REFRESH_IN_PROGRESS).into_response_with(StatusCode::CONFLICT)
            },
            CountriesApiError::RefreshError(err) => internal_error("Refresh failed", &err),

            CountriesApiError::ImageError(GetSummaryImageError::NotFound) => {
                ErrorResponse::new(SUMMARY_IMAGE_NOT_FOUND).into_response_with(StatusCode::NOT_FOUND)
            },
            CountriesApiError::ImageError(err) => {
                internal_error("Failed to read summary image", &err)
            },

            CountriesApiError::StatusError(err) => {
                internal_error("Store error during status query", &err)
            },
        }
    }
}
