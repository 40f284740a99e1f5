//! Features: named abilities granted by classes, races, or subclasses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::{ObjectId, StatBlock};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Feature {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub description: String,
    pub requirements: String,
    pub stat_bonus: Json<StatBlock>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureDraft {
    pub name: String,
    pub description: String,
    pub requirements: String,
    #[serde(default)]
    pub stat_bonus: StatBlock,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeaturePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub stat_bonus: Option<StatBlock>,
}

#[async_trait]
impl Resource for Feature {
    const NAME: &'static str = "feature";
    const TABLE: &'static str = "features";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("requirements", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = FeatureDraft;
    type Patch = FeaturePatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(
        pool: &PgPool,
        draft: FeatureDraft,
        caller: &ObjectId,
    ) -> Result<Self, ApiError> {
        let feature = sqlx::query_as::<_, Feature>(
            "INSERT INTO features (id, creator, name, description, requirements, stat_bonus)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.requirements)
        .bind(Json(draft.stat_bonus))
        .fetch_one(pool)
        .await?;
        Ok(feature)
    }

    async fn apply_update(
        pool: &PgPool,
        id: &ObjectId,
        patch: FeaturePatch,
    ) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE features SET ");
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
            if let Some(v) = patch.requirements {
                set.push("requirements = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.stat_bonus {
                set.push("stat_bonus = ").push_bind_unseparated(Json(v));
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
