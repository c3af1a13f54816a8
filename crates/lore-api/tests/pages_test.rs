//! Integration tests for the server-rendered play pages.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sqlx::PgPool;
use tower::ServiceExt;

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_home_lists_published_scenario(pool: PgPool) {
    common::create_scenario(&pool).await;

    let (status, html) = common::get_text(common::build_test_app(pool), "/lore").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Saltmere"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_play_form_redirects_to_new_adventure_page(pool: PgPool) {
    let scenario_id = common::create_scenario(&pool).await;

    let response = common::build_test_app(pool.clone())
        .oneshot(form_request(
            &format!("/lore/scenarios/{scenario_id}/play"),
            "title=Low+Tide",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_owned();
    assert!(location.starts_with("/lore/adventures/"));

    let (status, html) = common::get_text(common::build_test_app(pool), &location).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Low Tide"));
    assert!(html.contains("Mira"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_settings_page_shows_current_models(pool: PgPool) {
    let (status, html) = common::get_text(common::build_test_app(pool), "/lore/settings").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("gemma-3-12b-it"));
}
