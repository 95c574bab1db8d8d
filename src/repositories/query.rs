//! Dynamic SQL shared by the concrete repositories
//!
//! Filter column names come from a per-table allow-list, so they are safe
//! to splice into SQL text; filter values are always bound.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::traits::{FetchQuery, Listing, Page};
use crate::errors::{RepositoryError, RepositoryResult};

/// Static description of a table a repository reads from
pub(crate) struct TableDef {
    pub table: &'static str,
    pub alias: &'static str,
    pub select: &'static str,
    /// FROM clause, joins included
    pub from: &'static str,
    pub filterable: &'static [&'static str],
}

impl TableDef {
    fn check_filters(&self, query: &FetchQuery) -> RepositoryResult<()> {
        match query
            .filters
            .iter()
            .find(|(field, _)| !self.filterable.contains(&field.as_str()))
        {
            Some((field, _)) => Err(RepositoryError::invalid_filter(self.table, field.as_str())),
            None => Ok(()),
        }
    }

    fn push_where<'a>(&self, builder: &mut QueryBuilder<'a, Sqlite>, query: &FetchQuery) {
        for (i, (field, value)) in query.filters.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(format!("{}.{} = ", self.alias, field));
            builder.push_bind(value.clone());
        }
    }

    /// Run a filtered, optionally paginated fetch and decode rows as `R`
    pub async fn fetch<R>(&self, pool: &SqlitePool, query: &FetchQuery) -> RepositoryResult<Listing<R>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.check_filters(query)?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {}", self.select, self.from));
        self.push_where(&mut builder, query);
        builder.push(format!(" ORDER BY {}.rowid", self.alias));

        let Some(pagination) = query.pagination else {
            let rows = builder.build_query_as::<R>().fetch_all(pool).await?;
            return Ok(Listing::All(rows));
        };

        builder.push(" LIMIT ");
        builder.push_bind(pagination.per_page as i64);
        builder.push(" OFFSET ");
        builder.push_bind(pagination.offset() as i64);
        let rows = builder.build_query_as::<R>().fetch_all(pool).await?;

        let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", self.from));
        self.push_where(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        Ok(Listing::Page(Page::new(rows, pagination, total.max(0) as u64)))
    }

    /// Single row by primary key
    pub async fn find_by_id<R>(&self, pool: &SqlitePool, id: &str) -> RepositoryResult<Option<R>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT {} FROM {} WHERE {}.id = ?",
            self.select, self.from, self.alias
        );
        Ok(sqlx::query_as::<_, R>(&sql).bind(id).fetch_optional(pool).await?)
    }

    pub async fn delete(&self, pool: &SqlitePool, id: &str) -> RepositoryResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let result = sqlx::query(&sql).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
