use super::parse_id;
use super::queries::{
    COUNT_REQUESTS_FOR_PET, DELETE_PET, INSERT_PET, SELECT_PETS, SELECT_PET_BY_EXTERNAL_ID,
    SELECT_PET_BY_ID, UPDATE_PET,
};
use crate::model::PetProfile;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;
use zoozy_core::time::from_millis;

#[derive(Debug, FromRow)]
struct PetRow {
    id: String,
    external_id: String,
    name: String,
    species: String,
    breed: Option<String>,
    age: Option<i32>,
    vaccination_status: Option<String>,
    health_notes: Option<String>,
    owner_name: String,
    owner_contact: String,
    created_at: i64,
    updated_at: i64,
}

impl PetRow {
    fn into_model(self) -> Result<PetProfile, sqlx::Error> {
        Ok(PetProfile {
            id: parse_id(&self.id)?,
            external_id: self.external_id,
            name: self.name,
            species: self.species,
            breed: self.breed,
            age: self.age,
            vaccination_status: self.vaccination_status,
            health_notes: self.health_notes,
            owner_name: self.owner_name,
            owner_contact: self.owner_contact,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

pub async fn find_pet_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<PetProfile>, sqlx::Error> {
    let row = sqlx::query_as::<_, PetRow>(SELECT_PET_BY_EXTERNAL_ID)
        .bind(external_id)
        .fetch_optional(conn)
        .await?;
    row.map(PetRow::into_model).transpose()
}

pub async fn get_pet(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<PetProfile>, sqlx::Error> {
    let row = sqlx::query_as::<_, PetRow>(SELECT_PET_BY_ID)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?;
    row.map(PetRow::into_model).transpose()
}

pub async fn list_pets(conn: &mut SqliteConnection) -> Result<Vec<PetProfile>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PetRow>(SELECT_PETS)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(PetRow::into_model).collect()
}

pub async fn insert_pet(conn: &mut SqliteConnection, pet: &PetProfile) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_PET)
        .bind(pet.id.to_string())
        .bind(&pet.external_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.age)
        .bind(&pet.vaccination_status)
        .bind(&pet.health_notes)
        .bind(&pet.owner_name)
        .bind(&pet.owner_contact)
        .bind(pet.created_at.timestamp_millis())
        .bind(pet.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns `false` when no row carries the pet's id.
pub async fn update_pet(conn: &mut SqliteConnection, pet: &PetProfile) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(UPDATE_PET)
        .bind(pet.id.to_string())
        .bind(&pet.external_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(pet.age)
        .bind(&pet.vaccination_status)
        .bind(&pet.health_notes)
        .bind(&pet.owner_name)
        .bind(&pet.owner_contact)
        .bind(pet.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_pet(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(DELETE_PET)
        .bind(id.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_requests_for_pet(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(COUNT_REQUESTS_FOR_PET)
        .bind(id.to_string())
        .fetch_one(conn)
        .await
}
