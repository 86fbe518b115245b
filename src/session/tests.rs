use super::*;
use crate::storage::MemoryStorage;
use coursehub_shared::Role;
use std::cell::RefCell;

fn storages() -> (Rc<MemoryStorage>, Rc<MemoryStorage>) {
    (Rc::new(MemoryStorage::new()), Rc::new(MemoryStorage::new()))
}

fn sample_session(role: Role) -> Session {
    Session {
        token: "jwt-abc".into(),
        user: User {
            id: "u1".into(),
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            role,
        },
    }
}

#[test]
fn test_restore_valid_session() {
    let (durable, scratch) = storages();
    durable.set(TOKEN_KEY, "jwt-abc");
    durable.set(
        USER_KEY,
        r#"{"id":"u1","name":"Grace","email":"g@x.io","role":"student"}"#,
    );

    let store = SessionStore::restore(durable, scratch);
    assert_eq!(store.token().as_deref(), Some("jwt-abc"));
    assert_eq!(store.viewer(), Viewer::Student);
}

#[test]
fn test_restore_unparsable_user_clears_both() {
    let (durable, scratch) = storages();
    durable.set(TOKEN_KEY, "jwt-abc");
    durable.set(USER_KEY, "{not json");

    let store = SessionStore::restore(durable.clone(), scratch);
    assert!(store.current().is_none());
    assert_eq!(store.viewer(), Viewer::Anonymous);
    assert!(durable.get(TOKEN_KEY).is_none());
    assert!(durable.get(USER_KEY).is_none());
}

#[test]
fn test_restore_partial_presence_clears_both() {
    let (durable, scratch) = storages();
    durable.set(USER_KEY, r#"{"id":"u1","role":"admin"}"#);

    let store = SessionStore::restore(durable.clone(), scratch);
    assert!(store.current().is_none());
    assert!(durable.is_empty());
}

#[test]
fn test_establish_persists_and_notifies() {
    let (durable, scratch) = storages();
    let store = SessionStore::restore(durable.clone(), scratch);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |e| sink.borrow_mut().push(e));

    store.establish(sample_session(Role::Instructor)).unwrap();

    assert_eq!(durable.get(TOKEN_KEY).as_deref(), Some("jwt-abc"));
    let persisted: User = serde_json::from_str(&durable.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(persisted.role, Role::Instructor);
    assert_eq!(store.viewer(), Viewer::Instructor);
    assert_eq!(*events.borrow(), vec![SessionEvent::SignedIn]);
}

#[test]
fn test_logout_clears_only_session_keys() {
    let (durable, scratch) = storages();
    durable.set("unrelated", "keep");
    scratch.set(ACTIVE_SECTION_KEY, "my-courses");
    scratch.set("cache:course_1", "{}");

    let store = SessionStore::restore(durable.clone(), scratch.clone());
    store.establish(sample_session(Role::Student)).unwrap();
    store.logout();

    assert!(store.current().is_none());
    assert!(durable.get(TOKEN_KEY).is_none());
    assert!(durable.get(USER_KEY).is_none());
    assert_eq!(durable.get("unrelated").as_deref(), Some("keep"));
    assert!(scratch.get(ACTIVE_SECTION_KEY).is_none());
    assert!(scratch.get("cache:course_1").is_some());
}

#[test]
fn test_expire_emits_once() {
    let (durable, scratch) = storages();
    let store = SessionStore::restore(durable, scratch);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    store.subscribe(move |e| sink.borrow_mut().push(e));

    store.establish(sample_session(Role::Student)).unwrap();
    store.expire();
    store.expire();

    assert_eq!(
        *events.borrow(),
        vec![SessionEvent::SignedIn, SessionEvent::Expired]
    );
    assert!(store.require_user().unwrap_err().is_unauthorized());
}

#[test]
fn test_update_user_keeps_token() {
    let (durable, scratch) = storages();
    let store = SessionStore::restore(durable.clone(), scratch);
    assert!(store.update_user(sample_session(Role::Admin).user).is_err());

    store.establish(sample_session(Role::Student)).unwrap();
    let mut user = store.user().unwrap();
    user.name = "Grace B. Hopper".into();
    store.update_user(user).unwrap();

    assert_eq!(store.token().as_deref(), Some("jwt-abc"));
    assert!(durable.get(USER_KEY).unwrap().contains("Grace B. Hopper"));
}
