//! Items. The weapon/armor/tool split is a tagged enum serialized as JSONB,
//! with `i_type` as the discriminator; handlers match on it exhaustively
//! instead of probing dynamic fields.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::ObjectId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "i_type", rename_all = "lowercase")]
pub enum ItemKind {
    Weapon {
        damage_type: String,
        damage_dice: String,
        #[serde(default)]
        properties: Vec<String>,
        #[serde(default)]
        range: WeaponRange,
        category: String,
        #[serde(default)]
        two_handed: bool,
        #[serde(default)]
        can_throw: bool,
        #[serde(default = "default_true")]
        is_melee: bool,
    },
    Armor {
        armor_class: ArmorClass,
        category: String,
        #[serde(default)]
        stealth_disadv: bool,
    },
    Tool {
        category: String,
        #[serde(default)]
        proficiency_type: Option<String>,
    },
    Other,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponRange {
    pub normal: i32,
    pub maximum: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorClass {
    pub base: i32,
    pub dex_bonus: bool,
    pub max_dex_bonus: i32,
    /// Non-zero only for shields.
    pub shield_bonus: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: ObjectId,
    pub creator: ObjectId,
    pub name: String,
    pub description: String,
    pub weight: f64,
    /// In copper pieces.
    pub value: i64,
    pub rarity: String,
    pub kind: Json<ItemKind>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub value: i64,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    pub kind: ItemKind,
}

fn default_rarity() -> String {
    "common".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
    pub value: Option<i64>,
    pub rarity: Option<String>,
    pub kind: Option<ItemKind>,
}

#[async_trait]
impl Resource for Item {
    const NAME: &'static str = "item";
    const TABLE: &'static str = "items";
    const OWNER_COLUMN: Option<&'static str> = Some("creator");
    const USER_COLLECTION: Option<&'static str> = None;
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
        ("weight", ColumnKind::Float),
        ("value", ColumnKind::Int),
        ("rarity", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = ItemDraft;
    type Patch = ItemPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.creator)
    }

    async fn insert(pool: &PgPool, draft: ItemDraft, caller: &ObjectId) -> Result<Self, ApiError> {
        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (id, creator, name, description, weight, value, rarity, kind)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.weight)
        .bind(draft.value)
        .bind(draft.rarity)
        .bind(Json(draft.kind))
        .fetch_one(pool)
        .await?;
        Ok(item)
    }

    async fn apply_update(pool: &PgPool, id: &ObjectId, patch: ItemPatch) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE items SET ");
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
            if let Some(v) = patch.weight {
                set.push("weight = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.value {
                set.push("value = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.rarity {
                set.push("rarity = ").push_bind_unseparated(v);
                any = true;
            }
            if let Some(v) = patch.kind {
                set.push("kind = ").push_bind_unseparated(Json(v));
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
