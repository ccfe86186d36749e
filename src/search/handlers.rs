use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CatalogStats, DistilleryProfile, FilterCriteria, FilterPage, LimitQuery, PopularBottle,
    PriceStats, SearchQuery,
};
use super::filter::Scope;
use super::repo::{self, Location};
use crate::{
    bottles::repo_types::{Bottle, BottleSummary},
    error::{ApiError, ApiResult},
    extract::{Pagination, ValidQuery},
    state::AppState,
};

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search/bottles", get(search_catalog))
        .route("/search/filter", get(filter_catalog))
        .route("/search/popular", get(popular))
        .route("/search/stats", get(catalog_stats))
        .route("/search/regions/:region", get(by_region))
        .route("/search/countries/:country", get(by_country))
        .route("/search/distillery/:name", get(distillery))
        .route("/search/pricing/stats", get(price_stats))
        .route("/search/similar/:bottle_id", get(similar))
}

#[instrument(skip(state))]
pub async fn search_catalog(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Bottle>>> {
    let rows = repo::keyword(&state.db, Scope::Catalog, &query.q, page).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn filter_catalog(
    State(state): State<AppState>,
    ValidQuery(criteria): ValidQuery<FilterCriteria>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<FilterPage>> {
    let page = repo::filter(&state.db, Scope::Catalog, &criteria, page).await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn popular(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<LimitQuery>,
) -> ApiResult<Json<Vec<PopularBottle>>> {
    Ok(Json(repo::popular(&state.db, q.or(10)).await?))
}

#[instrument(skip(state))]
pub async fn catalog_stats(State(state): State<AppState>) -> ApiResult<Json<CatalogStats>> {
    Ok(Json(repo::catalog_stats(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn by_region(
    State(state): State<AppState>,
    Path(region): Path<String>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Bottle>>> {
    let rows = repo::by_location(&state.db, Location::Region, &region, page).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn by_country(
    State(state): State<AppState>,
    Path(country): Path<String>,
    ValidQuery(page): ValidQuery<Pagination>,
) -> ApiResult<Json<Vec<Bottle>>> {
    let rows = repo::by_location(&state.db, Location::Country, &country, page).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn distillery(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DistilleryProfile>> {
    let profile = repo::distillery_profile(&state.db, &name)
        .await?
        .ok_or_else(|| ApiError::not_found("Distillery not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn price_stats(State(state): State<AppState>) -> ApiResult<Json<PriceStats>> {
    Ok(Json(repo::price_stats(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn similar(
    State(state): State<AppState>,
    Path(bottle_id): Path<Uuid>,
    ValidQuery(q): ValidQuery<LimitQuery>,
) -> ApiResult<Json<Vec<BottleSummary>>> {
    Ok(Json(repo::similar(&state.db, bottle_id, q.or(5)).await?))
}
