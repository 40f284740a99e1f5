use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::{FilterValue, ListQuery};
use crate::types::ObjectId;

/// Typed table access for a [`Resource`].
///
/// All SQL built here uses bound parameters for values; identifiers come from
/// the resource's compile-time configuration, never from request input.
pub struct Repository<R> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<R>,
}

impl<R: Resource> Repository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<R>, ApiError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", R::TABLE);
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing row is a 404.
    pub async fn fetch(&self, id: &ObjectId) -> Result<R, ApiError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", R::NAME)))
    }

    /// Expand a list of ids into full records. Order follows the table scan,
    /// not the input; missing ids are silently skipped.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<R>, ApiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT * FROM {} WHERE id = ANY($1)", R::TABLE);
        let rows = sqlx::query_as::<_, R>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>, ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", R::TABLE));
        push_conditions(&mut qb, query);

        if !query.sort.is_empty() {
            qb.push(" ORDER BY ");
            for (i, key) in query.sort.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(key.column);
                qb.push(if key.descending { " DESC" } else { " ASC" });
            }
        }

        qb.push(" LIMIT ");
        qb.push_bind(query.limit);
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let rows = qb.build_query_as::<R>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn count(&self, query: &ListQuery) -> Result<i64, ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
        push_conditions(&mut qb, query);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    if query.conditions.is_empty() {
        return;
    }
    qb.push(" WHERE ");
    for (i, cond) in query.conditions.iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        qb.push(cond.column);
        qb.push(" ");
        qb.push(cond.op.sql());
        qb.push(" ");
        match &cond.value {
            FilterValue::Text(v) => qb.push_bind(v.clone()),
            FilterValue::Int(v) => qb.push_bind(*v),
            FilterValue::Float(v) => qb.push_bind(*v),
            FilterValue::Bool(v) => qb.push_bind(*v),
        };
    }
}
