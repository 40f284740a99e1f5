//! Campaigns. Owned by the game master; `character_ids` and `player_ids` are
//! rosters maintained by the relationship endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::controller::Resource;
use crate::database::models::user;
use crate::error::ApiError;
use crate::query::ColumnKind;
use crate::types::ObjectId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Campaign {
    pub id: ObjectId,
    pub owner: ObjectId,
    pub name: String,
    pub description: String,
    pub character_ids: Vec<ObjectId>,
    pub player_ids: Vec<ObjectId>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignDraft {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
impl Resource for Campaign {
    const NAME: &'static str = "campaign";
    const TABLE: &'static str = "campaigns";
    const OWNER_COLUMN: Option<&'static str> = Some("owner");
    const USER_COLLECTION: Option<&'static str> = Some("campaign_ids");
    const FILTERABLE: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Text),
        ("name", ColumnKind::Text),
    ];
    const DEFAULT_SORT: &'static str = "name";

    type Draft = CampaignDraft;
    type Patch = CampaignPatch;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn owner(&self) -> Option<&ObjectId> {
        Some(&self.owner)
    }

    async fn insert(
        pool: &PgPool,
        draft: CampaignDraft,
        caller: &ObjectId,
    ) -> Result<Self, ApiError> {
        let campaign = sqlx::query_as::<_, Campaign>(
            "INSERT INTO campaigns (id, owner, name, description)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(ObjectId::new())
        .bind(caller)
        .bind(draft.name)
        .bind(draft.description)
        .fetch_one(pool)
        .await?;
        Ok(campaign)
    }

    async fn apply_update(
        pool: &PgPool,
        id: &ObjectId,
        patch: CampaignPatch,
    ) -> Result<(), ApiError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE campaigns SET ");
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
        }
        if !any {
            return Ok(());
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.clone());
        qb.build().execute(pool).await?;
        Ok(())
    }

    /// Deleting a campaign also detaches every character that pointed at it,
    /// all in the same transaction as the row delete.
    async fn delete(pool: &PgPool, record: &Self, caller: &ObjectId) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE characters SET campaign = NULL WHERE campaign = $1")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;
        user::detach_from_collection(&mut *tx, caller, "campaign_ids", &record.id).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl Campaign {
    /// True when the user is the owner or on the player roster.
    pub fn is_member(&self, user_id: &ObjectId) -> bool {
        self.owner == *user_id || self.player_ids.contains(user_id)
    }
}

pub async fn add_character<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    character_id: &ObjectId,
) -> Result<(), ApiError> {
    append_unique(executor, campaign_id, "character_ids", character_id).await
}

pub async fn remove_character<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    character_id: &ObjectId,
) -> Result<(), ApiError> {
    remove_value(executor, campaign_id, "character_ids", character_id).await
}

pub async fn add_player<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    player_id: &ObjectId,
) -> Result<(), ApiError> {
    append_unique(executor, campaign_id, "player_ids", player_id).await
}

pub async fn remove_player<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    player_id: &ObjectId,
) -> Result<(), ApiError> {
    remove_value(executor, campaign_id, "player_ids", player_id).await
}

// The column name is a trusted constant from the helpers above.
async fn append_unique<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    column: &'static str,
    value: &ObjectId,
) -> Result<(), ApiError> {
    let sql = format!(
        "UPDATE campaigns SET {col} = array_append({col}, $1)
         WHERE id = $2 AND NOT ({col} @> ARRAY[$1])",
        col = column
    );
    sqlx::query(&sql)
        .bind(value)
        .bind(campaign_id)
        .execute(executor)
        .await?;
    Ok(())
}

async fn remove_value<'e>(
    executor: impl PgExecutor<'e>,
    campaign_id: &ObjectId,
    column: &'static str,
    value: &ObjectId,
) -> Result<(), ApiError> {
    let sql = format!(
        "UPDATE campaigns SET {col} = array_remove({col}, $1) WHERE id = $2",
        col = column
    );
    sqlx::query(&sql)
        .bind(value)
        .bind(campaign_id)
        .execute(executor)
        .await?;
    Ok(())
}
