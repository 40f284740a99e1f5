//! Subclasses: specializations of a class, bundling extra features.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::ObjectId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subclass {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub description: String,
    pub class_id: ObjectId,
    pub feature_ids: Vec<ObjectId>,
}

#[derive(Debug, Deserialize)]
pub struct SubclassDraft {
    pub name: String,
    pub description: String,
    pub class_id: ObjectId,
    #[serde(default)]
    pub feature_ids: Vec<ObjectId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubclassPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub class_id: Option<ObjectId>,
    pub feature_ids: Option<Vec<ObjectId>>,
}

#[async_trait]
impl Resource for Subclass {
    const NAME: &'static str = "subclass";
    const TABLE: &'static str = "subclasses";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("class_id", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = SubclassDraft;
    type Patch = SubclassPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(
        pool: &PgPool,
        draft: SubclassDraft,
        caller: &ObjectId,
    ) -> Result<Self, ApiError> {
        let subclass = sqlx::query_as::<_, Subclass>(
            "INSERT INTO subclasses (id, creator, name, description, class_id, feature_ids)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.class_id)
        .bind(draft.feature_ids)
        .fetch_one(pool)
        .await?;
        Ok(subclass)
    }

    async fn apply_update(
        pool: &PgPool,
        id: &ObjectId,
        patch: SubclassPatch,
    ) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE subclasses SET ");
        let mut any = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.description {
                set.push("description = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.class_id {
                set.push("class_id = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.feature_ids {
                set.push("feature_ids = ").push_bind_unseparated(v);
                any = true;
            }
        }
        if !any {
            return Ok(());
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.clone());
        qb.build().execute(pool).await?;
        Ok(())
    }
}
