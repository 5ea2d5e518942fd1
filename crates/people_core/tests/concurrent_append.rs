use async_trait::async_trait;
use people_core::{
    connect, FoodQuery, NewPerson, Person, PersonId, PersonRepository, PersonStore,
    PersonSummary, RepoResult, SqlitePersonRepository, StoreConfig,
};
use people_core::Connection;
use std::sync::Arc;
use tokio::sync::Barrier;

async fn memory_repo() -> SqlitePersonRepository {
    match connect(&StoreConfig::sqlite_memory()).await.unwrap() {
        Connection::Sqlite(handle) => SqlitePersonRepository::new(handle),
        other => panic!("unexpected backend: {other:?}"),
    }
}

#[tokio::test]
async fn interleaved_read_modify_write_loses_one_append() {
    let repo = memory_repo().await;
    let created = repo
        .insert_one(NewPerson::new("John").with_favorite_foods(["pizza", "pasta"]))
        .await
        .unwrap();

    // Both writers read the same snapshot before either saves.
    let mut first = repo.find_by_id(created.id).await.unwrap().unwrap();
    let mut second = repo.find_by_id(created.id).await.unwrap().unwrap();
    first.push_favorite_food("hamburger");
    second.push_favorite_food("fries");
    repo.save(&first).await.unwrap();
    repo.save(&second).await.unwrap();

    let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.favorite_foods, vec!["pizza", "pasta", "fries"]);
}

/// Holds every `save` until two saves are waiting, so each writer has
/// finished its load before any write lands.
struct SaveGate {
    inner: SqlitePersonRepository,
    saves: Barrier,
}

#[async_trait]
impl PersonRepository for SaveGate {
    async fn insert_one(&self, person: NewPerson) -> RepoResult<Person> {
        self.inner.insert_one(person).await
    }
    async fn insert_many(&self, records: Vec<NewPerson>) -> RepoResult<Vec<Person>> {
        self.inner.insert_many(records).await
    }
    async fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        self.inner.find_by_name(name).await
    }
    async fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        self.inner.find_one_by_food(food).await
    }
    async fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.inner.find_by_id(id).await
    }
    async fn save(&self, person: &Person) -> RepoResult<()> {
        self.saves.wait().await;
        self.inner.save(person).await
    }
    async fn set_age_by_name(&self, name: &str, age: i32) -> RepoResult<Option<Person>> {
        self.inner.set_age_by_name(name, age).await
    }
    async fn find_and_delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.inner.find_and_delete_by_id(id).await
    }
    async fn delete_many_by_name(&self, name: &str) -> RepoResult<u64> {
        self.inner.delete_many_by_name(name).await
    }
    async fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>> {
        self.inner.push_favorite_food(id, food).await
    }
    async fn query_by_food(&self, query: &FoodQuery) -> RepoResult<Vec<PersonSummary>> {
        self.inner.query_by_food(query).await
    }
    async fn count(&self) -> RepoResult<u64> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn concurrent_append_and_save_through_store_loses_one_append() {
    let store = PersonStore::new(Arc::new(SaveGate {
        inner: memory_repo().await,
        saves: Barrier::new(2),
    }));
    let created = store
        .create_one(NewPerson::new("John").with_favorite_foods(["pizza", "pasta"]))
        .await
        .unwrap();
    let id = created.id.to_hex();

    let (first, second) = tokio::join!(
        store.append_favorite_food_and_save(&id, "hamburger"),
        store.append_favorite_food_and_save(&id, "fries"),
    );
    // Each caller sees its own append in the returned record.
    assert_eq!(first.unwrap().favorite_foods, vec!["pizza", "pasta", "hamburger"]);
    assert_eq!(second.unwrap().favorite_foods, vec!["pizza", "pasta", "fries"]);

    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.favorite_foods.len(), 3);
    assert_eq!(&stored.favorite_foods[..2], ["pizza", "pasta"]);
    let kept = stored.favorite_foods[2].as_str();
    assert!(kept == "hamburger" || kept == "fries");
}

#[tokio::test]
async fn concurrent_push_favorite_food_keeps_every_append() {
    let repo = memory_repo().await;
    let store = PersonStore::new(Arc::new(repo));
    let created = store
        .create_one(NewPerson::new("John").with_favorite_foods(["pizza"]))
        .await
        .unwrap();
    let id = created.id.to_hex();

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move { store.push_favorite_food(&id, &format!("food-{n}")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.favorite_foods.len(), 9);
    assert_eq!(stored.favorite_foods[0], "pizza");
    for n in 0..8 {
        assert!(stored.favorite_foods.contains(&format!("food-{n}")));
    }
}

#[tokio::test]
async fn push_favorite_food_unknown_id_is_not_found() {
    let store = PersonStore::new(Arc::new(memory_repo().await));

    let err = store
        .push_favorite_food("6909b7d0d9dc40719a1a1c87", "hamburger")
        .await
        .unwrap_err();
    assert!(matches!(err, people_core::RepoError::NotFound(_)));
}

#[tokio::test]
async fn save_unknown_person_is_not_found() {
    let repo = memory_repo().await;
    let ghost = NewPerson::new("Ghost").into_person().unwrap();

    let err = repo.save(&ghost).await.unwrap_err();
    assert!(matches!(err, people_core::RepoError::NotFound(id) if id == ghost.id));
}
