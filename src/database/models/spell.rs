//! Spells. Damage dice stay opaque strings ("1d8+2"); parsing them is a
//! client concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::ObjectId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Spell {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub level: i32,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: Vec<String>,
    pub duration: String,
    /// "None", "Attack", or "Save".
    pub attack_save: String,
    pub damage_type: Option<String>,
    pub damage_dice: String,
}

#[derive(Debug, Deserialize)]
pub struct SpellDraft {
    pub name: String,
    pub level: i32,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: Vec<String>,
    pub duration: String,
    pub attack_save: String,
    #[serde(default)]
    pub damage_type: Option<String>,
    #[serde(default = "default_damage_dice")]
    pub damage_dice: String,
}

fn default_damage_dice() -> String {
    "none".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct SpellPatch {
    pub name: Option<String>,
    pub level: Option<i32>,
    pub school: Option<String>,
    pub casting_time: Option<String>,
    pub range: Option<String>,
    pub components: Option<Vec<String>>,
    pub duration: Option<String>,
    pub attack_save: Option<String>,
    pub damage_type: Option<String>,
    pub damage_dice: Option<String>,
}

#[async_trait]
impl Resource for Spell {
    const NAME: &'static str = "spell";
    const TABLE: &'static str = "spells";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("level", ColumnKind::Int),
        ("school", ColumnKind::Text),
        ("attack_save", ColumnKind::Text),
        ("damage_type", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "level,name";

    type Draft = SpellDraft;
    type Patch = SpellPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(pool: &PgPool, draft: SpellDraft, caller: &ObjectId) -> Result<Self, ApiError> {
        let spell = sqlx::query_as::<_, Spell>(
            "INSERT INTO spells (
                id, creator, name, level, school, casting_time, range, components,
                duration, attack_save, damage_type, damage_dice
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.level)
        .bind(draft.school)
        .bind(draft.casting_time)
        .bind(draft.range)
        .bind(draft.components)
        .bind(draft.duration)
        .bind(draft.attack_save)
        .bind(draft.damage_type)
        .bind(draft.damage_dice)
        .fetch_one(pool)
        .await?;
        Ok(spell)
    }

    async fn apply_update(pool: &PgPool, id: &ObjectId, patch: SpellPatch) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE spells SET ");
        let mut any = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.level {
                set.push("level = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.school {
                set.push("school = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.casting_time {
                set.push("casting_time = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.range {
                set.push("range = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.components {
                set.push("components = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.duration {
                set.push("duration = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.attack_save {
                set.push("attack_save = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.damage_type {
                set.push("damage_type = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.damage_dice {
                set.push("damage_dice = ").push_bind_unseparated(v);
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
