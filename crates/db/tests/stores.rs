//! PostgreSQL store tests.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p keygate-db -- --ignored`.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use keygate_core::error::CoreError;
use keygate_db::models::user::{CreateUser, UpdateUser};
use keygate_db::stores::{PgRevocationStore, PgUserDirectory, RevocationStore, UserDirectory};
use sqlx::PgPool;

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        salt: "c2FsdA".to_string(),
        first_name: "Grace".to_string(),
        last_name: Some("Hopper".to_string()),
        phone: Some("5550100200".to_string()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn bootstrap_health_check(pool: PgPool) {
    keygate_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn user_crud_round_trip(pool: PgPool) {
    let dir = PgUserDirectory::new(pool);

    let created = dir.create(&new_user("grace@navy.mil")).await.unwrap();
    let by_email = dir.find_by_email("grace@navy.mil").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);

    let patch = UpdateUser {
        phone: Some("5550100999".into()),
        ..Default::default()
    };
    let updated = dir.update(created.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.phone.as_deref(), Some("5550100999"));
    assert_eq!(updated.salt, created.salt);

    assert!(dir.delete(created.id).await.unwrap());
    assert!(dir.find_by_id(created.id).await.unwrap().is_none());
    assert!(!dir.delete(created.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_maps_to_conflict(pool: PgPool) {
    let dir = PgUserDirectory::new(pool);
    dir.create(&new_user("dup@x.com")).await.unwrap();

    let err = dir.create(&new_user("dup@x.com")).await.unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn revocation_add_twice_and_prune(pool: PgPool) {
    let store = PgRevocationStore::new(pool);
    let now = Utc::now();

    store.add("live-token", now + Duration::hours(1)).await.unwrap();
    store.add("live-token", now + Duration::hours(1)).await.unwrap();
    store.add("dead-token", now - Duration::hours(1)).await.unwrap();

    assert!(store.contains("live-token").await.unwrap());
    assert!(!store.contains("never-seen").await.unwrap());

    assert_eq!(store.prune_expired(now).await.unwrap(), 1);
    assert!(store.contains("live-token").await.unwrap());
    assert!(!store.contains("dead-token").await.unwrap());
}
