//! Data catalogue: data types, vocabulary types, and the mapping canvas.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cornerstone_core::{Error, Record};
use cornerstone_core::model::{
    AppId, DataType, MappingCanvas, Property, ProviderMapping, VocabMapping, VocabType,
};

use crate::error::ApiResult;
use crate::state::SharedState;

// ============================================================================
// Data types
// ============================================================================

pub async fn list_data_types(State(state): State<SharedState>) -> ApiResult<Json<Vec<DataType>>> {
    state.require_app(AppId::DataCatalogue).await?;
    Ok(Json(state.repos.data_types.list().await?))
}

pub async fn get_data_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataType>> {
    state.require_app(AppId::DataCatalogue).await?;
    Ok(Json(state.repos.data_types.get(&id).await?))
}

pub async fn create_data_type(
    State(state): State<SharedState>,
    Json(data_type): Json<DataType>,
) -> ApiResult<(StatusCode, Json<DataType>)> {
    state.require_app(AppId::DataCatalogue).await?;
    let _references = state.references.lock().await;
    let created = state.repos.data_types.insert(data_type).await?;
    tracing::info!(id = %created.id, "Data type created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_data_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(data_type): Json<DataType>,
) -> ApiResult<Json<DataType>> {
    state.require_app(AppId::DataCatalogue).await?;
    let _references = state.references.lock().await;
    Ok(Json(state.repos.data_types.update(&id, data_type).await?))
}

pub async fn delete_data_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::DataCatalogue).await?;
    state.repos.data_types.delete(&id).await?;
    tracing::info!(id, "Data type deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply `f` to a data type as one atomic edit and return its output.
async fn modify_data_type<R: Send>(
    state: &SharedState,
    id: &str,
    f: impl FnOnce(&mut DataType) -> cornerstone_core::Result<R> + Send,
) -> ApiResult<R> {
    state.require_app(AppId::DataCatalogue).await?;
    let mut out = None;
    state
        .repos
        .data_types
        .modify(
            id,
            Box::new(|data_type: &mut DataType| -> cornerstone_core::Result<()> {
                out = Some(f(data_type)?);
                Ok(())
            }),
        )
        .await?;
    Ok(out.ok_or_else(|| Error::not_found(DataType::KIND, id))?)
}

pub async fn add_property(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(property): Json<Property>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let added = modify_data_type(&state, &id, |dt| dt.add_property(property).cloned()).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn update_property(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(String, String)>,
    Json(property): Json<Property>,
) -> ApiResult<Json<Property>> {
    let updated =
        modify_data_type(&state, &id, |dt| dt.update_property(&pid, property).cloned()).await?;
    Ok(Json(updated))
}

pub async fn remove_property(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    modify_data_type(&state, &id, |dt| dt.remove_property(&pid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_provider_mapping(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mapping): Json<ProviderMapping>,
) -> ApiResult<(StatusCode, Json<ProviderMapping>)> {
    let added =
        modify_data_type(&state, &id, |dt| dt.add_provider_mapping(mapping).cloned()).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn remove_provider_mapping(
    State(state): State<SharedState>,
    Path((id, mid)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    modify_data_type(&state, &id, |dt| dt.remove_provider_mapping(&mid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Draw an edge on the canvas. Type-incompatible edges are stored and
/// flagged with `compatible: false`.
pub async fn map_property(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mapping): Json<VocabMapping>,
) -> ApiResult<Json<VocabMapping>> {
    state.require_app(AppId::DataCatalogue).await?;
    let _references = state.references.lock().await;
    let vocab = state
        .repos
        .vocab_types
        .get(&mapping.vocab_type_id)
        .await
        .map_err(|err| match err {
            Error::NotFound { .. } => Error::validation_field(
                "vocab_type_id",
                format!("unknown vocabulary type '{}'", mapping.vocab_type_id),
            ),
            other => other,
        })?;
    let mapped = modify_data_type(&state, &id, |dt| dt.map_property(mapping, &vocab)).await?;
    Ok(Json(mapped))
}

pub async fn unmap_property(
    State(state): State<SharedState>,
    Path((id, pid, vocab_type_id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    modify_data_type(&state, &id, |dt| dt.unmap_property(&pid, &vocab_type_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn canvas(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MappingCanvas>> {
    state.require_app(AppId::DataCatalogue).await?;
    let data_type = state.repos.data_types.get(&id).await?;
    let vocabs = state.repos.vocab_types.list().await?;
    Ok(Json(data_type.canvas(&vocabs)))
}

// ============================================================================
// Vocabulary types
// ============================================================================

pub async fn list_vocab_types(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<VocabType>>> {
    state.require_app(AppId::DataCatalogue).await?;
    Ok(Json(state.repos.vocab_types.list().await?))
}

pub async fn get_vocab_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VocabType>> {
    state.require_app(AppId::DataCatalogue).await?;
    Ok(Json(state.repos.vocab_types.get(&id).await?))
}

pub async fn create_vocab_type(
    State(state): State<SharedState>,
    Json(vocab): Json<VocabType>,
) -> ApiResult<(StatusCode, Json<VocabType>)> {
    state.require_app(AppId::DataCatalogue).await?;
    let created = state.repos.vocab_types.insert(vocab).await?;
    tracing::info!(id = %created.id, uri = %created.uri, "Vocabulary type created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_vocab_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(vocab): Json<VocabType>,
) -> ApiResult<Json<VocabType>> {
    state.require_app(AppId::DataCatalogue).await?;
    Ok(Json(state.repos.vocab_types.update(&id, vocab).await?))
}

/// Delete a vocabulary type no data type maps onto.
pub async fn delete_vocab_type(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::DataCatalogue).await?;
    let _references = state.references.lock().await;
    let vocab = state.repos.vocab_types.get(&id).await?;
    let data_types = state.repos.data_types.list().await?;
    if let Some(user) = data_types.iter().find(|dt| dt.references_vocab(&vocab.id)) {
        return Err(Error::in_use(
            "vocab_types",
            &vocab.id,
            format!("data type '{}'", user.name),
        )
        .into());
    }
    state.repos.vocab_types.delete(&id).await?;
    tracing::info!(id, "Vocabulary type deleted");
    Ok(StatusCode::NO_CONTENT)
}
