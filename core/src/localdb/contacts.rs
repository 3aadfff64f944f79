// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use sqlx::{SqliteConnection, SqlitePool};

use crate::Contact;

#[derive(Debug, Clone)]
pub struct Contacts {
    pool: SqlitePool,
}

impl Contacts {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or overwrites the records in one transaction.
    pub async fn upsert(&self, records: &[ContactRecord]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert_one(&mut tx, record).await?;
        }
        tx.commit().await
    }

    /// Makes the table hold exactly the given records, in one transaction.
    ///
    /// An empty input clears the table.
    pub async fn replace_all(&self, records: &[ContactRecord]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let removed = if records.is_empty() {
            sqlx::query("DELETE FROM contacts;")
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            for record in records {
                upsert_one(&mut tx, record).await?;
            }
            let keep = ids_json(records.iter().map(|r| r.id.as_str()));
            delete_except(&mut tx, &keep).await?
        };
        tx.commit().await?;
        Ok(removed)
    }

    /// Deletes every record whose id is not listed.
    pub async fn delete_except(&self, ids: &HashSet<String>) -> Result<u64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        delete_except(&mut conn, &ids_json(ids.iter().map(String::as_str))).await
    }

    /// Deletes the listed records.
    pub async fn delete_by_ids(&self, ids: &HashSet<String>) -> Result<u64, sqlx::Error> {
        const SQL: &str = "DELETE FROM contacts WHERE id IN (SELECT value FROM json_each(?));";

        let result = sqlx::query(SQL)
            .bind(ids_json(ids.iter().map(String::as_str)))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts;")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn get(&self, id: &str) -> Result<Option<ContactRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, name, phone_number, is_favorite, phone_numbers, emails, addresses
FROM contacts
WHERE id = ?;
";

        sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// All records ordered by name, case-insensitively.
    pub async fn list(&self) -> Result<Vec<ContactRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, name, phone_number, is_favorite, phone_numbers, emails, addresses
FROM contacts
ORDER BY name COLLATE NOCASE ASC, id ASC;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts;")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn all_ids(&self) -> Result<HashSet<String>, sqlx::Error> {
        let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM contacts;")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

async fn upsert_one(conn: &mut SqliteConnection, record: &ContactRecord) -> Result<(), sqlx::Error> {
    const SQL: &str = "\
INSERT INTO contacts (id, name, phone_number, is_favorite, phone_numbers, emails, addresses)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
    name          = excluded.name,
    phone_number  = excluded.phone_number,
    is_favorite   = excluded.is_favorite,
    phone_numbers = excluded.phone_numbers,
    emails        = excluded.emails,
    addresses     = excluded.addresses;
";

    sqlx::query(SQL)
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.phone_number)
        .bind(record.is_favorite)
        .bind(&record.phone_numbers)
        .bind(&record.emails)
        .bind(&record.addresses)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn delete_except(conn: &mut SqliteConnection, keep_json: &str) -> Result<u64, sqlx::Error> {
    const SQL: &str = "DELETE FROM contacts WHERE id NOT IN (SELECT value FROM json_each(?));";

    let result = sqlx::query(SQL)
        .bind(keep_json)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Encodes ids as a JSON array, bound as a single parameter to `json_each`.
fn ids_json<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    serde_json::Value::Array(ids.map(|id| id.into()).collect()).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContactRecord {
    id: String,
    name: String,
    phone_number: String,
    is_favorite: bool,
    phone_numbers: String,
    emails: String,
    addresses: String,
}

impl ContactRecord {
    pub fn from_contact(contact: &Contact) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: contact.id.clone(),
            name: contact.name.clone(),
            phone_number: contact.phone_number.clone(),
            is_favorite: contact.is_favorite,
            phone_numbers: serde_json::to_string(&contact.phone_numbers)?,
            emails: serde_json::to_string(&contact.emails)?,
            addresses: serde_json::to_string(&contact.addresses)?,
        })
    }

    /// Decodes the record; empty JSON columns read as empty collections.
    pub fn into_contact(self) -> Result<Contact, serde_json::Error> {
        Ok(Contact {
            phone_numbers: decode_list(&self.phone_numbers)?,
            emails: decode_list(&self.emails)?,
            addresses: decode_list(&self.addresses)?,
            id: self.id,
            name: self.name,
            phone_number: self.phone_number,
            is_favorite: self.is_favorite,
        })
    }
}

fn decode_list<T: serde::de::DeserializeOwned>(json: &str) -> Result<Vec<T>, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
}
