//! Pet catalog model and persistence for the pet store.
//!
//! Every operation here takes a borrowed [`Connection`] and runs a single
//! statement against the `pets` table. Callers own the connection lifetime;
//! the HTTP layer checks one out of the pool per request.
//!
//! Pets are never updated in place. They are created by the API or by the
//! startup seed, and removed only by an explicit delete.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during pet operations.
#[derive(Debug, Error)]
pub enum PetError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("pet not found: {0}")]
    NotFound(i64),
}

/// A pet listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pet {
    /// Server-generated primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free-form category such as "dog" or "cat".
    #[serde(rename = "type")]
    pub pet_type: String,
    /// Price in whole currency units. Not checked for sign.
    pub price: i64,
    pub description: Option<String>,
    /// Path under `/uploads/` or `/static/images/`, or the default image path.
    pub image_url: Option<String>,
}

/// Parameters for creating a new pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    pub name: String,
    pub pet_type: String,
    pub price: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// The rows inserted into an empty catalog on startup.
pub fn sample_pets() -> Vec<NewPet> {
    [
        (
            "Buddy",
            "dog",
            250,
            "Friendly Fluffy white dog",
            "/static/images/Fluffydog.jpeg",
        ),
        (
            "Whiskers",
            "cat",
            150,
            "Playful ginger cat",
            "/static/images/Gingercat.jpeg",
        ),
        (
            "Max",
            "dog",
            300,
            "Energetic husky dog",
            "/static/images/Huskydog.jpeg",
        ),
    ]
    .into_iter()
    .map(|(name, pet_type, price, description, image_url)| NewPet {
        name: name.to_string(),
        pet_type: pet_type.to_string(),
        price,
        description: Some(description.to_string()),
        image_url: Some(image_url.to_string()),
    })
    .collect()
}

fn map_row_to_pet(row: &Row) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        name: row.get(1)?,
        pet_type: row.get(2)?,
        price: row.get(3)?,
        description: row.get(4)?,
        image_url: row.get(5)?,
    })
}

/// Lists every pet in primary-key order.
pub fn list_pets(conn: &Connection) -> Result<Vec<Pet>, PetError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, price, description, image_url
        FROM pets ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], map_row_to_pet)?;
    let mut pets = Vec::new();
    for row in rows {
        pets.push(row?);
    }
    Ok(pets)
}

/// Retrieves a pet by its id.
pub fn get_pet(conn: &Connection, id: i64) -> Result<Pet, PetError> {
    conn.query_row(
        "SELECT id, name, type, price, description, image_url
        FROM pets WHERE id = ?1",
        [id],
        map_row_to_pet,
    )
    .optional()?
    .ok_or(PetError::NotFound(id))
}

/// Inserts a pet and returns it with its generated id.
pub fn create_pet(conn: &Connection, pet: &NewPet) -> Result<Pet, PetError> {
    let created = conn.query_row(
        "INSERT INTO pets (name, type, price, description, image_url)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id, name, type, price, description, image_url",
        params![
            pet.name,
            pet.pet_type,
            pet.price,
            pet.description,
            pet.image_url,
        ],
        map_row_to_pet,
    )?;
    Ok(created)
}

/// Deletes a pet by id.
///
/// Returns `NotFound` when no row matched.
pub fn delete_pet(conn: &Connection, id: i64) -> Result<(), PetError> {
    let deleted = conn.execute("DELETE FROM pets WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(PetError::NotFound(id));
    }
    Ok(())
}

/// Counts the pets in the catalog.
pub fn count_pets(conn: &Connection) -> Result<i64, PetError> {
    let count = conn.query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))?;
    Ok(count)
}

/// Inserts the sample catalog if the table is empty.
///
/// Returns the number of rows inserted (zero when any pet already exists).
/// The check runs on every call, so an emptied table is seeded again on the
/// next startup.
pub fn seed_sample_pets(conn: &Connection) -> Result<usize, PetError> {
    if count_pets(conn)? > 0 {
        tracing::debug!("pets table not empty, skipping seed");
        return Ok(0);
    }

    let samples = sample_pets();
    let tx = conn.unchecked_transaction()?;
    for pet in &samples {
        create_pet(&tx, pet)?;
    }
    tx.commit()?;

    tracing::info!(count = samples.len(), "seeded sample pets");
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        petstore_db::ensure_schema(&conn).expect("schema should be created");
        conn
    }

    fn new_pet(name: &str) -> NewPet {
        NewPet {
            name: name.to_string(),
            pet_type: "rabbit".to_string(),
            price: 42,
            description: Some("Fluffy".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn create_then_get_returns_same_pet() {
        let conn = setup();
        let created = create_pet(&conn, &new_pet("Thumper")).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "Thumper");
        assert_eq!(created.image_url, None);

        let fetched = get_pet(&conn, created.id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn ids_are_unique_and_listed_in_order() {
        let conn = setup();
        let a = create_pet(&conn, &new_pet("A")).unwrap();
        let b = create_pet(&conn, &new_pet("B")).unwrap();
        assert_ne!(a.id, b.id);

        let names: Vec<String> = list_pets(&conn).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn get_missing_pet_is_not_found() {
        let conn = setup();
        assert!(matches!(get_pet(&conn, 999), Err(PetError::NotFound(999))));
    }

    #[test]
    fn delete_twice_reports_not_found_second_time() {
        let conn = setup();
        let pet = create_pet(&conn, &new_pet("Gone")).unwrap();

        delete_pet(&conn, pet.id).unwrap();
        assert!(matches!(get_pet(&conn, pet.id), Err(PetError::NotFound(_))));
        assert!(matches!(
            delete_pet(&conn, pet.id),
            Err(PetError::NotFound(id)) if id == pet.id
        ));
    }

    #[test]
    fn negative_price_is_stored_verbatim() {
        let conn = setup();
        let mut pet = new_pet("Bargain");
        pet.price = -5;
        assert_eq!(create_pet(&conn, &pet).unwrap().price, -5);
    }

    #[test]
    fn seed_inserts_three_pets_once() {
        let conn = setup();
        assert_eq!(seed_sample_pets(&conn).unwrap(), 3);
        assert_eq!(seed_sample_pets(&conn).unwrap(), 0);

        let pets = list_pets(&conn).unwrap();
        let summary: Vec<(&str, &str, i64)> = pets
            .iter()
            .map(|p| (p.name.as_str(), p.pet_type.as_str(), p.price))
            .collect();
        assert_eq!(
            summary,
            vec![("Buddy", "dog", 250), ("Whiskers", "cat", 150), ("Max", "dog", 300)]
        );
        assert_eq!(
            pets[1].image_url.as_deref(),
            Some("/static/images/Gingercat.jpeg")
        );
    }

    #[test]
    fn seed_skips_non_empty_table() {
        let conn = setup();
        create_pet(&conn, &new_pet("Existing")).unwrap();
        assert_eq!(seed_sample_pets(&conn).unwrap(), 0);
        assert_eq!(count_pets(&conn).unwrap(), 1);
    }

    #[test]
    fn seed_runs_again_after_table_is_emptied() {
        let conn = setup();
        seed_sample_pets(&conn).unwrap();
        for pet in list_pets(&conn).unwrap() {
            delete_pet(&conn, pet.id).unwrap();
        }
        assert_eq!(seed_sample_pets(&conn).unwrap(), 3);
    }

    #[test]
    fn pet_serializes_type_key() {
        let pet = Pet {
            id: 7,
            name: "Nemo".to_string(),
            pet_type: "fish".to_string(),
            price: 5,
            description: None,
            image_url: Some("/assets/default-pet.jpg".to_string()),
        };
        let json = serde_json::to_value(&pet).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "name": "Nemo",
                "type": "fish",
                "price": 5,
                "description": null,
                "image_url": "/assets/default-pet.jpg"
            })
        );
    }
}
