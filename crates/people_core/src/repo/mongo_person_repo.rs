//! MongoDB implementation of `PersonRepository`.
//!
//! Every operation is a direct pass-through to one driver primitive; the
//! engine owns ordering, atomicity and identifier uniqueness.

use super::person_repo::{validate_batch, FoodQuery, PersonRepository, RepoError, RepoResult};
use crate::model::person::{NewPerson, Person, PersonId, PersonSummary};
use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

/// MongoDB-backed person repository.
#[derive(Clone)]
pub struct MongoPersonRepository {
    people: Collection<Person>,
    summaries: Collection<PersonSummary>,
}

impl MongoPersonRepository {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            people: database.collection(collection),
            summaries: database.collection(collection),
        }
    }
}

#[async_trait]
impl PersonRepository for MongoPersonRepository {
    async fn insert_one(&self, person: NewPerson) -> RepoResult<Person> {
        let person = person.into_person()?;
        self.people.insert_one(&person).await?;
        Ok(person)
    }

    async fn insert_many(&self, records: Vec<NewPerson>) -> RepoResult<Vec<Person>> {
        let people = validate_batch(records)?;
        if people.is_empty() {
            return Ok(people);
        }
        self.people.insert_many(&people).await?;
        Ok(people)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let cursor = self.people.find(doc! { "name": name }).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        Ok(self.people.find_one(doc! { "favoriteFoods": food }).await?)
    }

    async fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        Ok(self.people.find_one(doc! { "_id": id }).await?)
    }

    async fn save(&self, person: &Person) -> RepoResult<()> {
        let outcome = self
            .people
            .replace_one(doc! { "_id": person.id }, person)
            .await?;
        if outcome.matched_count == 0 {
            return Err(RepoError::NotFound(person.id));
        }
        Ok(())
    }

    async fn set_age_by_name(&self, name: &str, age: i32) -> RepoResult<Option<Person>> {
        Ok(self
            .people
            .find_one_and_update(doc! { "name": name }, doc! { "$set": { "age": age } })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn find_and_delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        Ok(self.people.find_one_and_delete(doc! { "_id": id }).await?)
    }

    async fn delete_many_by_name(&self, name: &str) -> RepoResult<u64> {
        let outcome = self.people.delete_many(doc! { "name": name }).await?;
        Ok(outcome.deleted_count)
    }

    async fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>> {
        Ok(self
            .people
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$push": { "favoriteFoods": food } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn query_by_food(&self, query: &FoodQuery) -> RepoResult<Vec<PersonSummary>> {
        // limit(0) means "no limit" to the engine.
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let sort_key = query.sort.field_name();
        let cursor = self
            .summaries
            .find(doc! { "favoriteFoods": query.food.as_str() })
            .sort(doc! { sort_key: 1 })
            .limit(i64::from(query.limit))
            .projection(doc! { "name": 1, "favoriteFoods": 1, "_id": 0 })
            .await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.people.count_documents(doc! {}).await?)
    }
}
