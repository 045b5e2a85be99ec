#![cfg(feature = "integration-tests")]

mod common;

use common::test_db::TestDatabase;
use server::db::user;
use server::error::Error;

#[tokio::test]
async fn test_user_create_and_retrieve() -> anyhow::Result<()> {
    let db = TestDatabase::new().await?;

    let created = user::create(
        &db.pool,
        "alice".to_string(),
        "alice@example.com".to_string(),
        "argon2-hash".to_string(),
    )
    .await?;

    assert_eq!(created.username, "alice");
    assert_eq!(created.email, "alice@example.com");
    assert_eq!(created.password_hash, "argon2-hash");
    assert!(created.created_at <= created.updated_at);

    let by_id = user::get_by_id(&db.pool, &created.user_id).await?;
    assert!(by_id.is_some());
    assert_eq!(by_id.unwrap().username, "alice");

    let by_username = user::get_by_username(&db.pool, "alice".to_string()).await?;
    assert!(by_username.is_some());
    assert_eq!(by_username.unwrap().user_id, created.user_id);

    let missing = user::get_by_username(&db.pool, "nobody".to_string()).await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_is_a_constraint_violation() -> anyhow::Result<()> {
    let db = TestDatabase::new().await?;

    user::create(
        &db.pool,
        "alice".to_string(),
        "alice@example.com".to_string(),
        "hash".to_string(),
    )
    .await?;

    let duplicate = user::create(
        &db.pool,
        "alice".to_string(),
        "other@example.com".to_string(),
        "hash".to_string(),
    )
    .await;

    match duplicate {
        Err(Error::ConstraintViolation { constraint, .. }) => {
            assert_eq!(constraint, "unique_username");
        }
        other => panic!("Expected unique_username violation, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_a_constraint_violation() -> anyhow::Result<()> {
    let db = TestDatabase::new().await?;

    user::create(
        &db.pool,
        "alice".to_string(),
        "alice@example.com".to_string(),
        "hash".to_string(),
    )
    .await?;

    let duplicate = user::create(
        &db.pool,
        "bob".to_string(),
        "alice@example.com".to_string(),
        "hash".to_string(),
    )
    .await;

    match duplicate {
        Err(Error::ConstraintViolation { constraint, .. }) => {
            assert_eq!(constraint, "unique_email");
        }
        other => panic!("Expected unique_email violation, got {other:?}"),
    }

    Ok(())
}
