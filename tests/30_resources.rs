mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_character_fills_defaults_and_stamps_owner() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/character", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Tava Stoneheart" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "success");
    let character = &body["data"]["character"];
    assert_eq!(character["name"], "Tava Stoneheart");
    assert_eq!(character["owner"], json!(account.id));
    assert_eq!(character["proficiency_bonus"], 2);
    assert_eq!(character["spell_slots_max"].as_array().map(Vec::len), Some(9));
    assert!(character["campaign"].is_null());

    // The new character shows up in the caller's expanded list
    let res = client
        .get(format!("{}/api/func/characters", server.base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"]["character"][0]["name"], "Tava Stoneheart");
    Ok(())
}

#[tokio::test]
async fn create_accepts_wrapped_and_bare_payloads() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let wrapped = client
        .post(format!("{}/api/func/campaign", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "campaign": { "name": "Sunken Vault", "description": "d" } }))
        .send()
        .await?;
    assert_eq!(wrapped.status(), StatusCode::CREATED);

    let bare = client
        .post(format!("{}/api/func/campaign", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Second Table", "description": "d" }))
        .send()
        .await?;
    assert_eq!(bare.status(), StatusCode::CREATED);

    let null_payload = client
        .post(format!("{}/api/func/campaign", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "campaign": null }))
        .send()
        .await?;
    assert_eq!(null_payload.status(), StatusCode::BAD_REQUEST);
    let body = null_payload.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "campaign data is required");
    Ok(())
}

#[tokio::test]
async fn update_round_trips_and_rejects_empty_patch() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/character", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Before" }))
        .send()
        .await?;
    let id = res.json::<serde_json::Value>().await?["data"]["character"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .put(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "After", "max_hit_points": 24 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["character"]["name"], "After");
    assert_eq!(body["data"]["character"]["max_hit_points"], 24);

    let empty = client
        .put(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body = empty.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Update data is required");
    Ok(())
}

#[tokio::test]
async fn patch_cannot_reassign_the_owner() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;
    let other = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/character", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Held" }))
        .send()
        .await?;
    let id = res.json::<serde_json::Value>().await?["data"]["character"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // The owner field in the patch is silently dropped
    let res = client
        .put(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Held", "owner": other.id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["character"]["owner"], json!(account.id));
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_lookup() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .get(format!("{}/api/func/character/not-hex", server.base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Invalid id format");

    // Well-formed but absent id
    let res = client
        .get(format!(
            "{}/api/func/character/0123456789abcdef01234567",
            server.base_url
        ))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_record_and_its_back_reference() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/character", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Doomed" }))
        .send()
        .await?;
    let id = res.json::<serde_json::Value>().await?["data"]["character"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .delete(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/func/character/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/api/func/characters", server.base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["results"], 0);
    Ok(())
}

#[tokio::test]
async fn lists_filter_sort_and_project() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    for (name, level) in [("Firebolt", 0), ("Fireball", 3), ("Meteor Swarm", 9)] {
        let res = client
            .post(format!("{}/api/func/spell", server.base_url))
            .bearer_auth(&account.token)
            .json(&json!({
                "name": name,
                "level": level,
                "school": "evocation",
                "casting_time": "1 action",
                "range": "120 feet",
                "components": ["V", "S"],
                "duration": "instantaneous",
                "attack_save": "Save",
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Range filter with bracket operators, explicit sort
    let res = client
        .get(format!(
            "{}/api/func/spell?level[gte]=3&sort=-level",
            server.base_url
        ))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["results"], 2);
    assert_eq!(body["data"]["spell"][0]["name"], "Meteor Swarm");
    assert_eq!(body["data"]["spell"][1]["name"], "Fireball");

    // Field projection keeps the id
    let res = client
        .get(format!(
            "{}/api/func/spell?fields=name&level=9",
            server.base_url
        ))
        .bearer_auth(&account.token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    let spell = &body["data"]["spell"][0];
    assert_eq!(spell["name"], "Meteor Swarm");
    assert!(spell["id"].is_string());
    assert!(spell.get("level").is_none());
    Ok(())
}

#[tokio::test]
async fn paging_past_the_end_is_a_404() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/race", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({ "name": "Hill Dwarf" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["race"]["speed"], 30);
    assert_eq!(body["data"]["race"]["size"], "medium");

    let res = client
        .get(format!("{}/api/func/race?page=1", server.base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/func/race?page=999", server.base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "This page does not exist");
    Ok(())
}

#[tokio::test]
async fn item_kinds_round_trip_through_jsonb() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let account = common::register_account(&client, &server.base_url).await?;

    let res = client
        .post(format!("{}/api/func/item", server.base_url))
        .bearer_auth(&account.token)
        .json(&json!({
            "name": "Longbow",
            "description": "A bow, long",
            "weight": 2.0,
            "value": 5000,
            "kind": {
                "i_type": "weapon",
                "damage_type": "piercing",
                "damage_dice": "1d8",
                "properties": ["heavy", "two-handed"],
                "range": { "normal": 150, "maximum": 600 },
                "category": "martial",
                "two_handed": true,
                "can_throw": false,
                "is_melee": false
            }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let id = body["data"]["item"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/api/func/item/{}", server.base_url, id))
        .bearer_auth(&account.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let item = &body["data"]["item"];
    assert_eq!(item["kind"]["i_type"], "weapon");
    assert_eq!(item["kind"]["range"]["maximum"], 600);
    assert_eq!(item["rarity"], "common");
    Ok(())
}
