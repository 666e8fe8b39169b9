//! Routes for the Identity Provider bounded context.
//!
//! Handlers only translate HTTP into commands; every rule lives in
//! `gatehouse_idp`.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use gatehouse_core::details::ObjectDetails;
use gatehouse_idp::application::command_handlers::{self, IdpCommandResult};
use gatehouse_idp::application::query_handlers::{self, ProviderView};
use gatehouse_idp::domain::commands::{
    AddLdapProvider, AddOidcProvider, RemoveProvider, UpdateLdapProvider, UpdateOidcProvider,
};
use gatehouse_idp::domain::ldap::LdapProvider;
use gatehouse_idp::domain::oidc::OidcProvider;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header naming the user a command is issued on behalf of.
pub const ACTOR_HEADER: &str = "x-gatehouse-actor";

const DEFAULT_ACTOR: &str = "system";

/// Object metadata after a command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    /// The owning organization.
    pub resource_owner: String,
    /// Aggregate version after the command.
    pub sequence: i64,
    /// Timestamp of the newest event.
    pub change_date: Option<DateTime<Utc>>,
}

impl From<ObjectDetails> for DetailsResponse {
    fn from(details: ObjectDetails) -> Self {
        Self {
            resource_owner: details.resource_owner,
            sequence: details.sequence,
            change_date: details.change_date,
        }
    }
}

/// Response body of every command endpoint.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The provider the command acted on.
    pub id: String,
    /// Resulting object metadata.
    pub details: DetailsResponse,
}

impl From<IdpCommandResult> for CommandResponse {
    fn from(result: IdpCommandResult) -> Self {
        Self {
            id: result.aggregate_id,
            details: result.details.into(),
        }
    }
}

fn actor(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_owned()
}

/// POST /orgs/{org_id}/idps/ldap
#[instrument(skip_all, fields(org_id = %org_id))]
async fn add_ldap_provider(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    headers: HeaderMap,
    Json(provider): Json<LdapProvider>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let command = AddLdapProvider {
        correlation_id: Uuid::new_v4(),
        actor: actor(&headers),
        resource_owner: org_id,
        provider,
    };
    info!(correlation_id = %command.correlation_id, "handling add_ldap_provider command");

    let result = command_handlers::handle_add_ldap_provider(
        &command,
        state.clock.as_ref(),
        state.id_generator.as_ref(),
        state.cipher.as_ref(),
        state.event_repository.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// PUT /orgs/{org_id}/idps/ldap/{id}
#[instrument(skip_all, fields(org_id = %org_id, id = %id))]
async fn update_ldap_provider(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(provider): Json<LdapProvider>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = UpdateLdapProvider {
        correlation_id: Uuid::new_v4(),
        actor: actor(&headers),
        resource_owner: org_id,
        id,
        provider,
    };
    info!(correlation_id = %command.correlation_id, "handling update_ldap_provider command");

    let result = command_handlers::handle_update_ldap_provider(
        &command,
        state.clock.as_ref(),
        state.cipher.as_ref(),
        state.event_repository.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /orgs/{org_id}/idps/oidc
#[instrument(skip_all, fields(org_id = %org_id))]
async fn add_oidc_provider(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    headers: HeaderMap,
    Json(provider): Json<OidcProvider>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let command = AddOidcProvider {
        correlation_id: Uuid::new_v4(),
        actor: actor(&headers),
        resource_owner: org_id,
        provider,
    };
    info!(correlation_id = %command.correlation_id, "handling add_oidc_provider command");

    let result = command_handlers::handle_add_oidc_provider(
        &command,
        state.clock.as_ref(),
        state.id_generator.as_ref(),
        state.cipher.as_ref(),
        state.event_repository.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// PUT /orgs/{org_id}/idps/oidc/{id}
#[instrument(skip_all, fields(org_id = %org_id, id = %id))]
async fn update_oidc_provider(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(provider): Json<OidcProvider>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = UpdateOidcProvider {
        correlation_id: Uuid::new_v4(),
        actor: actor(&headers),
        resource_owner: org_id,
        id,
        provider,
    };
    info!(correlation_id = %command.correlation_id, "handling update_oidc_provider command");

    let result = command_handlers::handle_update_oidc_provider(
        &command,
        state.clock.as_ref(),
        state.cipher.as_ref(),
        state.event_repository.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// DELETE /orgs/{org_id}/idps/{id}
#[instrument(skip_all, fields(org_id = %org_id, id = %id))]
async fn remove_provider(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = RemoveProvider {
        correlation_id: Uuid::new_v4(),
        actor: actor(&headers),
        resource_owner: org_id,
        id,
    };
    info!(correlation_id = %command.correlation_id, "handling remove_provider command");

    let result = command_handlers::handle_remove_provider(
        &command,
        state.clock.as_ref(),
        state.event_repository.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// GET /orgs/{org_id}/idps/{id}
async fn get_provider(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, String)>,
) -> Result<Json<ProviderView>, ApiError> {
    let view =
        query_handlers::get_provider_by_id(&id, &org_id, state.event_repository.as_ref()).await?;
    Ok(Json(view))
}

/// Returns the router for the identity provider context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orgs/{org_id}/idps/ldap", post(add_ldap_provider))
        .route("/orgs/{org_id}/idps/ldap/{id}", put(update_ldap_provider))
        .route("/orgs/{org_id}/idps/oidc", post(add_oidc_provider))
        .route("/orgs/{org_id}/idps/oidc/{id}", put(update_oidc_provider))
        .route(
            "/orgs/{org_id}/idps/{id}",
            get(get_provider).delete(remove_provider),
        )
}
