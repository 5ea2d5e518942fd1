use people_core::{
    connect, NewPerson, PersonStore, PersonValidationError, RepoError, StoreConfig,
};
use std::collections::HashSet;

async fn memory_store() -> PersonStore {
    let conn = connect(&StoreConfig::sqlite_memory()).await.unwrap();
    PersonStore::connect_to(&conn, "people")
}

fn john() -> NewPerson {
    NewPerson::new("John")
        .with_age(25)
        .with_favorite_foods(["pizza", "pasta"])
}

#[tokio::test]
async fn create_one_and_find_by_id_roundtrip() {
    let store = memory_store().await;

    let created = store.create_one(john()).await.unwrap();
    let loaded = store
        .find_by_id(&created.id.to_hex())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.name, "John");
    assert_eq!(loaded.age, Some(25));
    assert_eq!(loaded.favorite_foods, vec!["pizza", "pasta"]);
}

#[tokio::test]
async fn create_one_assigns_fresh_distinct_ids() {
    let store = memory_store().await;

    let mut ids = HashSet::new();
    for _ in 0..20 {
        let person = store.create_one(john()).await.unwrap();
        assert!(ids.insert(person.id), "id reused: {}", person.id);
    }
    assert_eq!(store.count().await.unwrap(), 20);
}

#[tokio::test]
async fn create_one_defaults_optional_fields() {
    let store = memory_store().await;

    let created = store.create_one(NewPerson::new("Ada")).await.unwrap();
    let loaded = store
        .find_by_id(&created.id.to_hex())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loaded.age, None);
    assert!(loaded.favorite_foods.is_empty());
}

#[tokio::test]
async fn create_one_without_name_fails_and_writes_nothing() {
    let store = memory_store().await;

    let err = store
        .create_one(NewPerson::default().with_age(40))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(PersonValidationError::MissingName)
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn create_many_returns_people_in_input_order() {
    let store = memory_store().await;

    let created = store
        .create_many(vec![
            NewPerson::new("Mary").with_age(30),
            NewPerson::new("David").with_age(22),
            NewPerson::new("Jane").with_age(29),
        ])
        .await
        .unwrap();

    let names: Vec<_> = created.iter().map(|person| person.name.as_str()).collect();
    assert_eq!(names, vec!["Mary", "David", "Jane"]);
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn create_many_rejects_whole_batch_on_invalid_record() {
    let store = memory_store().await;

    let err = store
        .create_many(vec![
            NewPerson::new("Mary"),
            NewPerson::default(),
            NewPerson::new("Jane"),
        ])
        .await
        .unwrap_err();

    match err {
        RepoError::Validation(PersonValidationError::InvalidBatchEntry { index, reason }) => {
            assert_eq!(index, 1);
            assert_eq!(*reason, PersonValidationError::MissingName);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn create_many_with_empty_batch_is_a_no_op() {
    let store = memory_store().await;

    assert!(store.create_many(Vec::new()).await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn find_by_id_rejects_malformed_id() {
    let store = memory_store().await;

    let err = store.find_by_id("not-an-object-id").await.unwrap_err();
    assert!(matches!(err, RepoError::InvalidId(value) if value == "not-an-object-id"));
}

#[tokio::test]
async fn find_by_id_rejects_padded_id_without_echoing_input() {
    let store = memory_store().await;
    let created = store.create_one(john()).await.unwrap();
    let padded = format!(" {}\n", created.id.to_hex());

    let err = store.find_by_id(&padded).await.unwrap_err();
    assert_eq!(err.code(), "invalid_id");
    let message = err.to_string();
    assert_eq!(message, "invalid person id (26 chars)");
    assert!(!message.contains(&created.id.to_hex()));
}

#[tokio::test]
async fn find_by_id_returns_none_for_unknown_id() {
    let store = memory_store().await;
    store.create_one(john()).await.unwrap();

    let found = store
        .find_by_id("6909b7d0d9dc40719a1a1c87")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn append_favorite_food_and_save_appends_to_end() {
    let store = memory_store().await;
    let created = store.create_one(john()).await.unwrap();

    let updated = store
        .append_favorite_food_and_save(&created.id.to_hex(), "hamburger")
        .await
        .unwrap();

    assert_eq!(updated.favorite_foods, vec!["pizza", "pasta", "hamburger"]);
    let reloaded = store
        .find_by_id(&created.id.to_hex())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded, updated);
}

#[tokio::test]
async fn append_favorite_food_and_save_unknown_id_is_not_found() {
    let store = memory_store().await;

    let err = store
        .append_favorite_food_and_save("6909b7d0d9dc40719a1a1c87", "hamburger")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    let err = store
        .append_favorite_food_and_save("zzz", "hamburger")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidId(_)));
}

#[tokio::test]
async fn set_age_by_name_updates_one_record_and_keeps_other_fields() {
    let store = memory_store().await;
    let created = store.create_one(john()).await.unwrap();

    let updated = store.set_age_by_name("John", 20).await.unwrap().unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.age, Some(20));
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.favorite_foods, created.favorite_foods);
}

#[tokio::test]
async fn set_age_by_name_touches_exactly_one_of_several_matches() {
    let store = memory_store().await;
    store
        .create_many(vec![
            NewPerson::new("John").with_age(25),
            NewPerson::new("John").with_age(31),
        ])
        .await
        .unwrap();

    store.set_age_by_name("John", 20).await.unwrap().unwrap();

    let ages: Vec<_> = store
        .find_by_name("John")
        .await
        .unwrap()
        .into_iter()
        .map(|person| person.age)
        .collect();
    assert_eq!(ages.iter().filter(|age| **age == Some(20)).count(), 1);
}

#[tokio::test]
async fn set_age_by_name_without_match_returns_none() {
    let store = memory_store().await;
    store.create_one(john()).await.unwrap();

    let updated = store.set_age_by_name("Nobody", 20).await.unwrap();

    assert!(updated.is_none());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_by_id_returns_removed_record() {
    let store = memory_store().await;
    let created = store.create_one(john()).await.unwrap();

    let removed = store.delete_by_id(&created.id.to_hex()).await.unwrap();

    assert_eq!(removed, created);
    assert!(store
        .find_by_id(&created.id.to_hex())
        .await
        .unwrap()
        .is_none());

    let err = store.delete_by_id(&created.id.to_hex()).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == created.id));
}

#[tokio::test]
async fn delete_all_by_name_counts_removed_records() {
    let store = memory_store().await;
    store
        .create_many(vec![
            NewPerson::new("Mary"),
            NewPerson::new("David"),
            NewPerson::new("Mary"),
            NewPerson::new("mary"),
        ])
        .await
        .unwrap();

    assert_eq!(store.delete_all_by_name("Mary").await.unwrap(), 2);
    assert_eq!(store.delete_all_by_name("Mary").await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 2);
}
