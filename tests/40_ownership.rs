mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_character(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/api/func/character", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    Ok(body["data"]["character"]["id"].as_str().unwrap().to_string())
}

async fn create_campaign(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/api/func/campaign", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "description": "a table" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    Ok(body["data"]["campaign"]["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn strangers_cannot_touch_another_users_character() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let alice = common::register_account(&client, &server.base_url).await?;
    let bob = common::register_account(&client, &server.base_url).await?;

    let id = create_character(&client, &server.base_url, &alice.token, "Guarded").await?;

    let read = client
        .get(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(read.status(), StatusCode::FORBIDDEN);
    let body = read.json::<Value>().await?;
    assert_eq!(body["message"], "Not authorized to access this resource");

    let update = client
        .put(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .json(&json!({ "name": "Stolen" }))
        .send()
        .await?;
    assert_eq!(update.status(), StatusCode::FORBIDDEN);
    let body = update.json::<Value>().await?;
    assert_eq!(body["message"], "Not authorized to update this resource");

    let delete = client
        .delete(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);
    let body = delete.json::<Value>().await?;
    assert_eq!(body["message"], "Not authorized to delete this resource");
    Ok(())
}

#[tokio::test]
async fn lists_are_scoped_to_the_caller() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let alice = common::register_account(&client, &server.base_url).await?;
    let bob = common::register_account(&client, &server.base_url).await?;

    create_character(&client, &server.base_url, &alice.token, "AliceOnly").await?;

    let res = client
        .get(format!("{}/api/func/character", server.base_url))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["results"], 0);

    // Owner is not a filterable column, so a forged filter is rejected
    // outright instead of widening the scope
    let res = client
        .get(format!(
            "{}/api/func/character?owner={}",
            server.base_url, alice.id
        ))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Cannot filter by field 'owner'");
    Ok(())
}

#[tokio::test]
async fn campaign_roster_links_members_and_characters() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let dm = common::register_account(&client, &server.base_url).await?;
    let player = common::register_account(&client, &server.base_url).await?;

    let campaign_id = create_campaign(&client, &server.base_url, &dm.token, "Deep Halls").await?;
    let character_id =
        create_character(&client, &server.base_url, &player.token, "Wren").await?;

    // Before joining, the player cannot read the campaign
    let res = client
        .get(format!(
            "{}/api/func/campaign/{}",
            server.base_url, campaign_id
        ))
        .bearer_auth(&player.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Only the campaign owner may manage the roster
    let res = client
        .put(format!(
            "{}/api/func/campaign/{}/character/{}",
            server.base_url, campaign_id, character_id
        ))
        .bearer_auth(&player.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(format!(
            "{}/api/func/campaign/{}/character/{}",
            server.base_url, campaign_id, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Character added to campaign successfully");

    // Membership fans out: the player can now read the campaign, the
    // character points at it, and the DM (as co-member) can read the
    // player's character.
    let res = client
        .get(format!(
            "{}/api/func/campaign/{}",
            server.base_url, campaign_id
        ))
        .bearer_auth(&player.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let campaign = &body["data"]["campaign"];
    assert!(campaign["character_ids"]
        .as_array()
        .unwrap()
        .contains(&json!(character_id)));
    assert!(campaign["player_ids"]
        .as_array()
        .unwrap()
        .contains(&json!(player.id)));

    let res = client
        .get(format!(
            "{}/api/func/character/{}",
            server.base_url, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["character"]["campaign"], json!(campaign_id));

    // The campaign shows up in the player's expanded list
    let res = client
        .get(format!("{}/api/func/my-campaigns", server.base_url))
        .bearer_auth(&player.token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["results"], 1);

    // Removal reverses every link
    let res = client
        .delete(format!(
            "{}/api/func/campaign/{}/character/{}",
            server.base_url, campaign_id, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Character removed from campaign successfully");

    let res = client
        .get(format!(
            "{}/api/func/character/{}",
            server.base_url, character_id
        ))
        .bearer_auth(&player.token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert!(body["data"]["character"]["campaign"].is_null());

    let res = client
        .get(format!(
            "{}/api/func/campaign/{}",
            server.base_url, campaign_id
        ))
        .bearer_auth(&player.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_scrubs_surviving_campaign_rosters() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let dm = common::register_account(&client, &server.base_url).await?;
    let player = common::register_account(&client, &server.base_url).await?;

    let campaign_id = create_campaign(&client, &server.base_url, &dm.token, "Open Table").await?;
    let character_id =
        create_character(&client, &server.base_url, &player.token, "Fleeting").await?;

    let res = client
        .put(format!(
            "{}/api/func/campaign/{}/character/{}",
            server.base_url, campaign_id, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The player deletes their account; the DM's campaign survives but
    // must no longer reference the player or their character.
    let res = client
        .delete(format!("{}/api/auth/delete-user", server.base_url))
        .json(&json!({ "userId": player.id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!(
            "{}/api/func/campaign/{}",
            server.base_url, campaign_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let campaign = &body["data"]["campaign"];
    assert!(
        !campaign["player_ids"]
            .as_array()
            .unwrap()
            .contains(&json!(player.id)),
        "player still on roster: {}",
        campaign
    );
    assert!(
        !campaign["character_ids"]
            .as_array()
            .unwrap()
            .contains(&json!(character_id)),
        "character still on roster: {}",
        campaign
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_campaign_detaches_member_characters() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let dm = common::register_account(&client, &server.base_url).await?;

    let campaign_id = create_campaign(&client, &server.base_url, &dm.token, "Short Lived").await?;
    let character_id = create_character(&client, &server.base_url, &dm.token, "Loyal").await?;

    let res = client
        .put(format!(
            "{}/api/func/campaign/{}/character/{}",
            server.base_url, campaign_id, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!(
            "{}/api/func/campaign/{}",
            server.base_url, campaign_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!(
            "{}/api/func/character/{}",
            server.base_url, character_id
        ))
        .bearer_auth(&dm.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert!(body["data"]["character"]["campaign"].is_null());
    Ok(())
}
