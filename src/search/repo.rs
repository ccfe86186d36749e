use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{
    CatalogStats, DistilleryProfile, FilterCriteria, FilterPage, OwnerStats, PopularBottle,
    PriceStats, SpiritCount,
};
use super::filter::{
    contains_pattern, count_query, push_criteria, push_keyword, push_order, select_query, Scope,
    SortKey, SortOrder,
};
use super::stats::price_summary;
use crate::bottles::repo::{push_page, VISIBLE_BOTTLE};
use crate::bottles::repo_types::{Bottle, BottleSummary};
use crate::extract::Pagination;

pub async fn filter(
    db: &PgPool,
    scope: Scope,
    criteria: &FilterCriteria,
    page: Pagination,
) -> anyhow::Result<FilterPage> {
    let mut count = count_query(scope);
    push_criteria(&mut count, criteria);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(db)
        .await
        .context("count filtered bottles")?;

    let mut qb = select_query(scope);
    push_criteria(&mut qb, criteria);
    push_order(
        &mut qb,
        SortKey::parse(criteria.sort_by.as_deref()),
        SortOrder::parse(criteria.sort_order.as_deref()),
    );
    push_page(&mut qb, page);
    let bottles = qb
        .build_query_as::<Bottle>()
        .fetch_all(db)
        .await
        .context("filter bottles")?;

    Ok(FilterPage {
        total,
        count: bottles.len(),
        skip: page.skip,
        limit: page.limit,
        bottles,
    })
}

pub async fn keyword(
    db: &PgPool,
    scope: Scope,
    q: &str,
    page: Pagination,
) -> anyhow::Result<Vec<Bottle>> {
    let mut qb = select_query(scope);
    push_keyword(&mut qb, q);
    push_order(&mut qb, SortKey::CreatedAt, SortOrder::Desc);
    push_page(&mut qb, page);
    let rows = qb
        .build_query_as::<Bottle>()
        .fetch_all(db)
        .await
        .context("search bottles")?;
    Ok(rows)
}

/// Which location column `by_location` matches against.
#[derive(Debug, Clone, Copy)]
pub enum Location {
    Region,
    Country,
}

pub async fn by_location(
    db: &PgPool,
    location: Location,
    value: &str,
    page: Pagination,
) -> anyhow::Result<Vec<Bottle>> {
    let column = match location {
        Location::Region => "b.region",
        Location::Country => "b.country",
    };
    let mut qb = select_query(Scope::Catalog);
    qb.push(" AND ")
        .push(column)
        .push(" ILIKE ")
        .push_bind(contains_pattern(value.trim()));
    qb.push(" ORDER BY b.rating DESC NULLS LAST, b.created_at DESC, b.id DESC");
    push_page(&mut qb, page);
    let rows = qb
        .build_query_as::<Bottle>()
        .fetch_all(db)
        .await
        .context("list bottles by location")?;
    Ok(rows)
}

async fn spirit_breakdown(db: &PgPool, scope: Scope) -> anyhow::Result<Vec<SpiritCount>> {
    let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT b.spirit_type, COUNT(*) AS count FROM bottles b WHERE ",
    );
    qb.push(VISIBLE_BOTTLE);
    if let Scope::Owner(owner) = scope {
        qb.push(" AND b.user_id = ").push_bind(owner);
    }
    qb.push(" GROUP BY b.spirit_type ORDER BY count DESC, b.spirit_type");
    let rows = qb
        .build_query_as::<SpiritCount>()
        .fetch_all(db)
        .await
        .context("spirit breakdown")?;
    Ok(rows)
}

pub async fn catalog_stats(db: &PgPool) -> anyhow::Result<CatalogStats> {
    let (total_bottles, average_price): (i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), AVG(b.price_paid)::float8
          FROM bottles b
         WHERE b.deleted_at IS NULL
        "#,
    )
    .fetch_one(db)
    .await
    .context("catalog totals")?;

    let spirit_breakdown = spirit_breakdown(db, Scope::Catalog).await?;
    let most_common_spirit = spirit_breakdown.first().map(|s| s.spirit_type);

    Ok(CatalogStats {
        total_bottles,
        spirit_breakdown,
        average_price: average_price.map(round2),
        most_common_spirit,
    })
}

pub async fn owner_stats(db: &PgPool, owner: Uuid) -> anyhow::Result<OwnerStats> {
    let (total_bottles, average_rating): (i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), AVG(b.rating)::float8
          FROM bottles b
         WHERE b.deleted_at IS NULL AND b.user_id = $1
        "#,
    )
    .bind(owner)
    .fetch_one(db)
    .await
    .context("owner totals")?;

    Ok(OwnerStats {
        total_bottles,
        average_rating: average_rating.map(round2),
        spirit_breakdown: spirit_breakdown(db, Scope::Owner(owner)).await?,
    })
}

pub async fn price_stats(db: &PgPool) -> anyhow::Result<PriceStats> {
    let prices: Vec<Decimal> = sqlx::query_scalar(
        r#"
        SELECT b.price_paid
          FROM bottles b
         WHERE b.deleted_at IS NULL AND b.price_paid IS NOT NULL
         ORDER BY b.price_paid
        "#,
    )
    .fetch_all(db)
    .await
    .context("load prices")?;
    Ok(price_summary(&prices))
}

pub async fn popular(db: &PgPool, limit: i64) -> anyhow::Result<Vec<PopularBottle>> {
    let rows = sqlx::query_as::<_, PopularBottle>(
        r#"
        SELECT b.id, b.name, b.spirit_type, b.distillery,
               b.rating AS personal_rating,
               AVG(tn.rating)::float8 AS community_rating,
               COUNT(tn.id) AS total_reviews
          FROM bottles b
          LEFT JOIN tasting_notes tn ON tn.bottle_id = b.id
         WHERE b.deleted_at IS NULL AND b.rating IS NOT NULL
         GROUP BY b.id
         ORDER BY community_rating DESC NULLS LAST, b.rating DESC, b.id
         LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
    .context("popular bottles")?;
    Ok(rows)
}

pub async fn distillery_profile(
    db: &PgPool,
    name: &str,
) -> anyhow::Result<Option<DistilleryProfile>> {
    let pattern = contains_pattern(name.trim());

    let (total_bottles, countries, regions, spirit_types): (
        i64,
        Vec<String>,
        Vec<String>,
        Vec<String>,
    ) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(ARRAY_AGG(DISTINCT b.country) FILTER (WHERE b.country IS NOT NULL)::text[], '{}'),
               COALESCE(ARRAY_AGG(DISTINCT b.region) FILTER (WHERE b.region IS NOT NULL)::text[], '{}'),
               COALESCE(ARRAY_AGG(DISTINCT b.spirit_type)::text[], '{}')
          FROM bottles b
         WHERE b.deleted_at IS NULL AND b.distillery ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(db)
    .await
    .context("distillery profile")?;

    if total_bottles == 0 {
        return Ok(None);
    }

    let average_rating: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT AVG(tn.rating)::float8
          FROM tasting_notes tn
          JOIN bottles b ON b.id = tn.bottle_id
         WHERE b.deleted_at IS NULL AND b.distillery ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(db)
    .await
    .context("distillery rating")?;

    Ok(Some(DistilleryProfile {
        distillery: name.trim().to_string(),
        total_bottles,
        countries,
        regions,
        spirit_types,
        average_rating: average_rating.map(round2),
    }))
}

/// Visible bottles sharing the source's category, newest first. Empty when
/// the source itself is not visible.
pub async fn similar(db: &PgPool, bottle_id: Uuid, limit: i64) -> anyhow::Result<Vec<BottleSummary>> {
    let rows = sqlx::query_as::<_, BottleSummary>(
        r#"
        SELECT b.id, b.name, b.spirit_type, b.distillery, b.rating
          FROM bottles b
         WHERE b.deleted_at IS NULL
           AND b.id <> $1
           AND b.spirit_type = (
               SELECT s.spirit_type FROM bottles s
                WHERE s.id = $1 AND s.deleted_at IS NULL
           )
         ORDER BY b.created_at DESC, b.id DESC
         LIMIT $2
        "#,
    )
    .bind(bottle_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("similar bottles")?;
    Ok(rows)
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
