mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn adding_a_member_grants_access() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;
    let (nina, nina_user) = common::register(&app, "Nina", "nina@example.com", None).await?;

    let (_, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen" })),
    )
    .await?;
    let id = created["id"].as_str().unwrap();
    let path = format!("/projects/{}", id);

    // Before membership the client is shut out
    let (status, _) = common::send(&app, Method::GET, &path, Some(&nina), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({ "members": [common::user_id(&nina_user)] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["members"].as_array().map(Vec::len), Some(1));

    let (status, body) = common::send(&app, Method::GET, &path, Some(&nina), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"][0]["id"], nina_user["id"]);
    Ok(())
}

#[tokio::test]
async fn removing_a_member_revokes_access() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;
    let (nina, nina_user) = common::register(&app, "Nina", "nina@example.com", None).await?;
    let (_, theo_user) = common::register(&app, "Theo", "theo@example.com", None).await?;

    let (_, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({
            "name": "Loft kitchen",
            "members": [common::user_id(&nina_user), common::user_id(&theo_user)],
        })),
    )
    .await?;
    let path = format!("/projects/{}", created["id"].as_str().unwrap());

    // Desired list drops Nina and keeps Theo
    let (status, updated) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({ "members": [common::user_id(&theo_user)] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["members"].as_array().map(Vec::len), Some(1));
    assert_eq!(updated["members"][0]["id"], theo_user["id"]);

    let (status, _) = common::send(&app, Method::GET, &path, Some(&nina), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn duplicate_member_ids_collapse_to_one() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;
    let (_, nina_user) = common::register(&app, "Nina", "nina@example.com", None).await?;
    let nina_id = common::user_id(&nina_user);

    let (status, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen", "members": [nina_id, nina_id, nina_id] })),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["members"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn unknown_member_id_on_create_is_rejected_without_persisting() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen", "members": [uuid::Uuid::new_v4()] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    // The rejected create left nothing behind
    let (_, list) = common::send(&app, Method::GET, "/projects", Some(&dana), None).await?;
    assert_eq!(list.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn unknown_member_id_is_rejected_without_partial_write() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;
    let (_, nina_user) = common::register(&app, "Nina", "nina@example.com", None).await?;

    let (_, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen" })),
    )
    .await?;
    let path = format!("/projects/{}", created["id"].as_str().unwrap());

    let (status, body) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({
            "name": "Should not stick",
            "members": [common::user_id(&nina_user), uuid::Uuid::new_v4()],
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    // The failed update left the project untouched
    let (_, fetched) = common::send(&app, Method::GET, &path, Some(&dana), None).await?;
    assert_eq!(fetched["name"], "Loft kitchen");
    assert_eq!(fetched["members"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn absent_member_list_means_no_membership_change() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;
    let (_, nina_user) = common::register(&app, "Nina", "nina@example.com", None).await?;

    let (_, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen", "members": [common::user_id(&nina_user)] })),
    )
    .await?;
    let path = format!("/projects/{}", created["id"].as_str().unwrap());

    let (status, updated) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({ "description": "New brief attached" })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "New brief attached");
    assert_eq!(updated["members"].as_array().map(Vec::len), Some(1));

    // An explicit empty list, by contrast, clears membership
    let (status, cleared) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({ "members": [] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["members"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn updates_bump_the_version() -> Result<()> {
    let app = common::test_app();
    let (dana, _) = common::register(&app, "Dana", "dana@example.com", Some("DESIGNER")).await?;

    let (_, created) = common::send(
        &app,
        Method::POST,
        "/projects",
        Some(&dana),
        Some(json!({ "name": "Loft kitchen" })),
    )
    .await?;
    let path = format!("/projects/{}", created["id"].as_str().unwrap());
    let v0 = created["version"].as_i64().unwrap();

    let (_, updated) = common::send(
        &app,
        Method::PUT,
        &path,
        Some(&dana),
        Some(json!({ "status": "IN_PROGRESS" })),
    )
    .await?;

    assert_eq!(updated["version"].as_i64().unwrap(), v0 + 1);
    Ok(())
}
