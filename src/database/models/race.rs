//! Races: stat increases, movement, size, languages, innate features.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::{ObjectId, StatBlock};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Race {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub stats_increase: Json<StatBlock>,
    pub speed: i32,
    pub size: String,
    pub languages: Vec<String>,
    pub feature_ids: Vec<ObjectId>,
}

#[derive(Debug, Deserialize)]
pub struct RaceDraft {
    pub name: String,
    #[serde(default)]
    pub stats_increase: StatBlock,
    #[serde(default = "default_speed")]
    pub speed: i32,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub feature_ids: Vec<ObjectId>,
}

fn default_speed() -> i32 {
    30
}

fn default_size() -> String {
    "medium".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct RacePatch {
    pub name: Option<String>,
    pub stats_increase: Option<StatBlock>,
    pub speed: Option<i32>,
    pub size: Option<String>,
    pub languages: Option<Vec<String>>,
    pub feature_ids: Option<Vec<ObjectId>>,
}

#[async_trait]
impl Resource for Race {
    const NAME: &'static str = "race";
    const TABLE: &'static str = "races";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("speed", ColumnKind::Int),
        ("size", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = RaceDraft;
    type Patch = RacePatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(pool: &PgPool, draft: RaceDraft, caller: &ObjectId) -> Result<Self, ApiError> {
        let race = sqlx::query_as::<_, Race>(
            "INSERT INTO races (
                id, creator, name, stats_increase, speed, size, languages, feature_ids
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(Json(draft.stats_increase))
        .bind(draft.speed)
        .bind(draft.size)
        .bind(draft.languages)
        .bind(draft.feature_ids)
        .fetch_one(pool)
        .await?;
        Ok(race)
    }

    async fn apply_update(pool: &PgPool, id: &ObjectId, patch: RacePatch) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE races SET ");
        let mut any = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.stats_increase {
                set.push("stats_increase = ").push_bind_unseparated(Json(v));
                any = true;
            }
            if let Some(v) = patch.speed {
                set.push("speed = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.size {
                set.push("size = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.languages {
                set.push("languages = ").push_bind_unseparated(v);
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
