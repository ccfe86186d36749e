use sqlx::{Encode, Postgres, QueryBuilder, Type};
use uuid::Uuid;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Builds `UPDATE <table> SET updated_at = now(), col = $n, ... WHERE id = $m`
/// from only the fields a caller actually supplied.
pub struct PatchBuilder<'a> {
    qb: QueryBuilder<'a, Postgres>,
}

impl<'a> PatchBuilder<'a> {
    pub fn new(table: &str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET updated_at = now()")),
        }
    }

    pub fn set<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Send + Type<Postgres>,
    {
        self.qb.push(", ").push(column).push(" = ").push_bind(value);
        self
    }

    /// `None` leaves the column untouched.
    pub fn set_if<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Send + Type<Postgres>,
    {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    /// Appends `WHERE id = $n` and returns the builder for further predicates.
    pub fn where_id(mut self, id: Uuid) -> QueryBuilder<'a, Postgres> {
        self.qb.push(" WHERE id = ").push_bind(id);
        self.qb
    }
}
