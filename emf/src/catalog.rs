use axum::Json;
use axum::Router;
use emf_errors::ErrorDefinition;
use emf_server::{Paginated, RequestErrors};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    error_code: String,
    status_code: u16,
    description: String,
    locales: Vec<String>,
    data: IndexMap<String, String>,
}

impl From<&ErrorDefinition> for CatalogEntry {
    fn from(definition: &ErrorDefinition) -> Self {
        Self {
            error_code: definition.code.clone(),
            status_code: definition.status_code,
            description: definition.description.clone(),
            locales: definition.messages.keys().cloned().collect(),
            data: definition.data.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    total: usize,
    limit: u64,
    offset: u64,
    errors: Vec<CatalogEntry>,
}

/// Routes exposing the merged error taxonomy
pub fn router() -> Router {
    Router::new().route("/errors", axum::routing::get(list_errors))
}

/// List registered definitions, builtins first
async fn list_errors(errors: RequestErrors, Paginated(page): Paginated) -> Json<CatalogPage> {
    let registry = errors.registry();
    let skip = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit).unwrap_or(usize::MAX);

    let entries = registry
        .codes()
        .skip(skip)
        .take(take)
        .filter_map(|code| registry.get_definition(code))
        .map(CatalogEntry::from)
        .collect();

    Json(CatalogPage {
        total: registry.len(),
        limit: page.limit,
        offset: page.offset,
        errors: entries,
    })
}
