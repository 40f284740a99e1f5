//! Character classes: hit die, proficiencies, and per-level feature unlocks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::ObjectId;

/// Map from level (JSON object key) to the feature ids unlocked at it.
pub type LevelUnlocks = BTreeMap<String, Vec<ObjectId>>;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Class {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub hit_die: i32,
    pub saving_throws: Vec<String>,
    pub skill_proficiencies: Vec<String>,
    pub armor_proficiencies: Vec<ObjectId>,
    pub weapon_proficiencies: Vec<ObjectId>,
    pub tool_proficiencies: Vec<ObjectId>,
    pub level_unlocks: Json<LevelUnlocks>,
}

#[derive(Debug, Deserialize)]
pub struct ClassDraft {
    pub name: String,
    pub hit_die: i32,
    #[serde(default)]
    pub saving_throws: Vec<String>,
    #[serde(default)]
    pub skill_proficiencies: Vec<String>,
    #[serde(default)]
    pub armor_proficiencies: Vec<ObjectId>,
    #[serde(default)]
    pub weapon_proficiencies: Vec<ObjectId>,
    #[serde(default)]
    pub tool_proficiencies: Vec<ObjectId>,
    #[serde(default)]
    pub level_unlocks: LevelUnlocks,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub hit_die: Option<i32>,
    pub saving_throws: Option<Vec<String>>,
    pub skill_proficiencies: Option<Vec<String>>,
    pub armor_proficiencies: Option<Vec<ObjectId>>,
    pub weapon_proficiencies: Option<Vec<ObjectId>>,
    pub tool_proficiencies: Option<Vec<ObjectId>>,
    pub level_unlocks: Option<LevelUnlocks>,
}

#[async_trait]
impl Resource for Class {
    const NAME: &'static str = "class";
    const TABLE: &'static str = "classes";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("hit_die", ColumnKind::Int),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = ClassDraft;
    type Patch = ClassPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(pool: &PgPool, draft: ClassDraft, caller: &ObjectId) -> Result<Self, ApiError> {
        let class = sqlx::query_as::<_, Class>(
            "INSERT INTO classes (
                id, creator, name, hit_die, saving_throws, skill_proficiencies,
                armor_proficiencies, weapon_proficiencies, tool_proficiencies, level_unlocks
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.hit_die)
        .bind(draft.saving_throws)
        .bind(draft.skill_proficiencies)
        .bind(draft.armor_proficiencies)
        .bind(draft.weapon_proficiencies)
        .bind(draft.tool_proficiencies)
        .bind(Json(draft.level_unlocks))
        .fetch_one(pool)
        .await?;
        Ok(class)
    }

    async fn apply_update(pool: &PgPool, id: &ObjectId, patch: ClassPatch) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE classes SET ");
        let mut any = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.hit_die {
                set.push("hit_die = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.saving_throws {
                set.push("saving_throws = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.skill_proficiencies {
                set.push("skill_proficiencies = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.armor_proficiencies {
                set.push("armor_proficiencies = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.weapon_proficiencies {
                set.push("weapon_proficiencies = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.tool_proficiencies {
                set.push("tool_proficiencies = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.level_unlocks {
                set.push("level_unlocks = ").push_bind_unseparated(Json(v));
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
