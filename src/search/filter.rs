//! Predicate composition for the filter and keyword search endpoints.
//!
//! Both the catalog-wide and the owner-scoped variants go through the same
//! builder so the visibility predicate and sort allow-list are applied once.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::dto::FilterCriteria;
use crate::bottles::repo::{BOTTLE_COLUMNS, VISIBLE_BOTTLE};

/// Whose bottles a query ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Catalog,
    Owner(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Name,
    Rating,
    PricePaid,
}

impl SortKey {
    /// Unknown keys fall back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name") => SortKey::Name,
            Some("rating") => SortKey::Rating,
            Some("price_paid") => SortKey::PricePaid,
            _ => SortKey::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "b.created_at",
            SortKey::Name => "b.name",
            SortKey::Rating => "b.rating",
            SortKey::PricePaid => "b.price_paid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// `%needle%` with LIKE metacharacters escaped, so input matches literally.
pub fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope) {
    qb.push(VISIBLE_BOTTLE);
    if let Scope::Owner(owner) = scope {
        qb.push(" AND b.user_id = ").push_bind(owner);
    }
}

/// Appends ` AND ...` for every supplied criterion.
pub fn push_criteria(qb: &mut QueryBuilder<'_, Postgres>, c: &FilterCriteria) {
    if let Some(t) = non_blank(&c.spirit_type) {
        qb.push(" AND b.spirit_type ILIKE ")
            .push_bind(contains_pattern(&t));
    }
    if let Some(v) = c.min_proof {
        qb.push(" AND b.proof >= ").push_bind(v);
    }
    if let Some(v) = c.max_proof {
        qb.push(" AND b.proof <= ").push_bind(v);
    }
    if let Some(v) = c.min_price {
        qb.push(" AND b.price_paid >= ").push_bind(v);
    }
    if let Some(v) = c.max_price {
        qb.push(" AND b.price_paid <= ").push_bind(v);
    }
    if let Some(r) = non_blank(&c.region) {
        qb.push(" AND b.region ILIKE ").push_bind(contains_pattern(&r));
    }
    if let Some(r) = non_blank(&c.country) {
        qb.push(" AND b.country ILIKE ").push_bind(contains_pattern(&r));
    }
    if let Some(v) = c.min_rating {
        qb.push(" AND b.rating >= ").push_bind(v);
    }
    if let Some(v) = c.max_rating {
        qb.push(" AND b.rating <= ").push_bind(v);
    }
    if let Some(v) = c.year_from {
        qb.push(" AND b.release_year >= ").push_bind(v);
    }
    if let Some(v) = c.year_to {
        qb.push(" AND b.release_year <= ").push_bind(v);
    }
}

/// Keyword match over name, distillery, region and country.
pub fn push_keyword(qb: &mut QueryBuilder<'_, Postgres>, q: &str) {
    let pattern = contains_pattern(q.trim());
    qb.push(" AND (");
    for (i, column) in ["b.name", "b.distillery", "b.region", "b.country"]
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(column).push(" ILIKE ").push_bind(pattern.clone());
    }
    qb.push(")");
}

/// Deterministic ordering; ties resolve on id in the same direction.
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, key: SortKey, order: SortOrder) {
    qb.push(" ORDER BY ")
        .push(key.column())
        .push(" ")
        .push(order.sql())
        .push(" NULLS LAST, b.id ")
        .push(order.sql());
}

pub fn count_query<'a>(scope: Scope) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM bottles b WHERE ");
    push_scope(&mut qb, scope);
    qb
}

pub fn select_query<'a>(scope: Scope) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOTTLE_COLUMNS} FROM bottles b WHERE "));
    push_scope(&mut qb, scope);
    qb
}
