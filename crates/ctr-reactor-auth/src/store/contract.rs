//! Behaviour every [`UserStore`] must share, run against each implementation.

use chrono::{Duration, Utc};
use ctr_reactor_core::ReactorError;

use super::UserStore;
use crate::user::NewUser;

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: Some("Contract".to_string()),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c29tZXNhbHQ$aGFzaGhhc2hoYXNo".to_string(),
    }
}

pub(crate) async fn exercise(store: &dyn UserStore) {
    store.ping().await.unwrap();

    // Users
    let user = store.create_user(new_user("a@b.com")).await.unwrap();
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.name.as_deref(), Some("Contract"));
    assert!(!user.verified);

    let dup = store.create_user(new_user("a@b.com")).await.unwrap_err();
    assert!(matches!(dup, ReactorError::DuplicateEmail), "got {dup:?}");

    let by_email = store.find_user_by_email("a@b.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    let by_id = store.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "a@b.com");
    assert!(store.find_user_by_email("missing@b.com").await.unwrap().is_none());

    store.update_password_hash(&user.id, "rehashed").await.unwrap();
    let updated = store.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(updated.password_hash, "rehashed");

    // Sessions
    let now = Utc::now();
    let live = store
        .create_session(&user.id, "live-hash", now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(live.user_id, user.id);
    let stale = store
        .create_session(&user.id, "stale-hash", now - Duration::seconds(5))
        .await
        .unwrap();
    assert!(!stale.is_valid(now));

    let found = store
        .find_session_by_token_hash("live-hash")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.user_id, user.id);
    assert!(found.is_valid(now));

    // Expired rows are still returned; expiry is enforced by the caller.
    assert!(store
        .find_session_by_token_hash("stale-hash")
        .await
        .unwrap()
        .is_some());

    let removed = store.delete_expired_sessions(now).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store
        .find_session_by_token_hash("stale-hash")
        .await
        .unwrap()
        .is_none());

    store.delete_session("live-hash").await.unwrap();
    store.delete_session("live-hash").await.unwrap();
    assert!(store
        .find_session_by_token_hash("live-hash")
        .await
        .unwrap()
        .is_none());
}
