//! Player characters. Owned by the creating user and tracked on the user's
//! `character_ids` array; optionally attached to one campaign.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::{Currency, ObjectId, StatBlock};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Character {
    pub id: ObjectId,
    pub owner: ObjectId,
    pub campaign: Option<ObjectId>,
    pub name: String,
    pub class_ids: Vec<ObjectId>,
    pub levels: Vec<i32>,
    pub race_ids: Vec<ObjectId>,
    pub alignment: Option<String>,
    pub proficiency_bonus: i32,
    pub saving_throws: Vec<String>,
    pub base_stats: Json<StatBlock>,
    pub skill_proficiencies: Vec<String>,
    pub languages: Vec<String>,
    pub max_hit_points: i32,
    pub current_hit_points: i32,
    pub equipment: Vec<ObjectId>,
    pub currency: Json<Currency>,
    pub feature_ids: Vec<ObjectId>,
    pub spell_ids: Vec<ObjectId>,
    pub spell_slots_max: Vec<i32>,
    pub spell_slots_used: Vec<i32>,
    pub appearance: String,
}

#[derive(Debug, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(default)]
    pub campaign: Option<ObjectId>,
    #[serde(default)]
    pub class_ids: Vec<ObjectId>,
    #[serde(default)]
    pub levels: Vec<i32>,
    #[serde(default)]
    pub race_ids: Vec<ObjectId>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default = "default_proficiency_bonus")]
    pub proficiency_bonus: i32,
    #[serde(default)]
    pub saving_throws: Vec<String>,
    #[serde(default)]
    pub base_stats: StatBlock,
    #[serde(default)]
    pub skill_proficiencies: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub max_hit_points: i32,
    #[serde(default)]
    pub current_hit_points: i32,
    #[serde(default)]
    pub equipment: Vec<ObjectId>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub feature_ids: Vec<ObjectId>,
    #[serde(default)]
    pub spell_ids: Vec<ObjectId>,
    #[serde(default = "default_spell_slots")]
    pub spell_slots_max: Vec<i32>,
    #[serde(default = "default_spell_slots")]
    pub spell_slots_used: Vec<i32>,
    #[serde(default)]
    pub appearance: String,
}

fn default_proficiency_bonus() -> i32 {
    2
}

// Distinguishes a field set to `null` from a field that is absent.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// Nine slot levels, all empty.
fn default_spell_slots() -> Vec<i32> {
    vec![0; 9]
}

/// Partial update. There is deliberately no `owner` field here: a
/// client-supplied owner disappears during deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct CharacterPatch {
    pub name: Option<String>,
    /// Absent means "leave unchanged"; an explicit `null` detaches the
    /// character from its campaign.
    #[serde(default, deserialize_with = "double_option")]
    pub campaign: Option<Option<ObjectId>>,
    pub class_ids: Option<Vec<ObjectId>>,
    pub levels: Option<Vec<i32>>,
    pub race_ids: Option<Vec<ObjectId>>,
    pub alignment: Option<String>,
    pub proficiency_bonus: Option<i32>,
    pub saving_throws: Option<Vec<String>>,
    pub base_stats: Option<StatBlock>,
    pub skill_proficiencies: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub max_hit_points: Option<i32>,
    pub current_hit_points: Option<i32>,
    pub equipment: Option<Vec<ObjectId>>,
    pub currency: Option<Currency>,
    pub feature_ids: Option<Vec<ObjectId>>,
    pub spell_ids: Option<Vec<ObjectId>>,
    pub spell_slots_max: Option<Vec<i32>>,
    pub spell_slots_used: Option<Vec<i32>>,
    pub appearance: Option<String>,
}

#[async_trait]
impl Resource for Character {
    const NAME: &'static str = "character";
    const TABLE: &'static str = "characters";
    const OWNER_COLUMN: Option<&'static str> = Some("owner");
    const USER_COLLECTION: Option<&'static str> = Some("character_ids");
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("campaign", ColumnKind::Text),
        ("alignment", ColumnKind::Text),
        ("proficiency_bonus", ColumnKind::Int),
        ("max_hit_points", ColumnKind::Int),
        ("current_hit_points", ColumnKind::Int),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = CharacterDraft;
    type Patch = CharacterPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.owner)
    }

    async fn insert(
        pool: &PgPool,
        draft: CharacterDraft,
        caller: &ObjectId,
    ) -> Result<Self, ApiError> {
        let character = sqlx::query_as::<_, Character>(
            "INSERT INTO characters (
                id, owner, campaign, name, class_ids, levels, race_ids, alignment,
                proficiency_bonus, saving_throws, base_stats, skill_proficiencies,
                languages, max_hit_points, current_hit_points, equipment, currency,
                feature_ids, spell_ids, spell_slots_max, spell_slots_used, appearance
             ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
             ) RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.campaign)
        .bind(draft.name)
        .bind(draft.class_ids)
        .bind(draft.levels)
        .bind(draft.race_ids)
        .bind(draft.alignment)
        .bind(draft.proficiency_bonus)
        .bind(draft.saving_throws)
        .bind(Json(draft.base_stats))
        .bind(draft.skill_proficiencies)
        .bind(draft.languages)
        .bind(draft.max_hit_points)
        .bind(draft.current_hit_points)
        .bind(draft.equipment)
        .bind(Json(draft.currency))
        .bind(draft.feature_ids)
        .bind(draft.spell_ids)
        .bind(draft.spell_slots_max)
        .bind(draft.spell_slots_used)
        .bind(draft.appearance)
        .fetch_one(pool)
        .await?;
        Ok(character)
    }

    async fn apply_update(
        pool: &PgPool,
        id: &ObjectId,
        patch: CharacterPatch,
    ) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE characters SET ");
        let mut any = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.campaign {
                set.push("campaign = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.class_ids {
                set.push("class_ids = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.levels {
                set.push("levels = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.race_ids {
                set.push("race_ids = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.alignment {
                set.push("alignment = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.proficiency_bonus {
                set.push("proficiency_bonus = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.saving_throws {
                set.push("saving_throws = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.base_stats {
                set.push("base_stats = ").push_bind_unseparated(Json(v));
                any = true;
            }
            if let Some(v) = patch.skill_proficiencies {
                set.push("skill_proficiencies = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.languages {
                set.push("languages = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.max_hit_points {
                set.push("max_hit_points = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.current_hit_points {
                set.push("current_hit_points = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.equipment {
                set.push("equipment = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.currency {
                set.push("currency = ").push_bind_unseparated(Json(v));
                any = true;
            }
            if let Some(v) = patch.feature_ids {
                set.push("feature_ids = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.spell_ids {
                set.push("spell_ids = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.spell_slots_max {
                set.push("spell_slots_max = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.spell_slots_used {
                set.push("spell_slots_used = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.appearance {
                set.push("appearance = ").push_bind_unseparated(v);
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

/// Point a character at a campaign (or detach with `None`). Used by the
/// campaign relationship endpoints, which bypass the ownership rule on the
/// character itself.
pub async fn set_campaign<'e>(
    executor: impl PgExecutor<'e>,
    character_id: &ObjectId,
    campaign_id: Option<&ObjectId>,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE characters SET campaign = $1 WHERE id = $2")
        .bind(campaign_id)
        .bind(character_id)
        .execute(executor)
        .await?;
    Ok(())
}
