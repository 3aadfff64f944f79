// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Reads contact snapshots out of the device contact store.

use std::collections::HashSet;
use std::sync::Arc;

use jiff::Timestamp;

use crate::device::{DeviceSource, Filter, Query, Row, Sort, SourceError, Table, columns};
use crate::format::format_phone_number;
use crate::{Address, AddressType, Contact, Email, EmailType, PhoneNumber, PhoneType};

const CONTACT_PROJECTION: &[&str] = &[
    columns::ID,
    columns::DISPLAY_NAME,
    columns::STARRED,
    columns::LAST_UPDATED,
];
const ID_PROJECTION: &[&str] = &[columns::ID];
const DETAIL_PROJECTION: &[&str] = &[columns::DATA, columns::TYPE];

/// Builds [`Contact`]s from the rows of a [`DeviceSource`].
///
/// Every public method moves the blocking queries onto the runtime's blocking
/// pool. Contacts without a display name or without any phone number are
/// skipped.
#[derive(Clone)]
pub struct ContactReader {
    source: Arc<dyn DeviceSource>,
}

impl std::fmt::Debug for ContactReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactReader").finish_non_exhaustive()
    }
}

impl ContactReader {
    pub fn new(source: Arc<dyn DeviceSource>) -> Self {
        Self { source }
    }

    /// Reads every contact, ordered by display name.
    pub async fn read_full(&self) -> Result<Vec<Contact>, SourceError> {
        self.blocking(|source| read_contacts(source, None)).await
    }

    /// Reads the contacts modified strictly after `since`.
    pub async fn read_changed_since(&self, since: Timestamp) -> Result<Vec<Contact>, SourceError> {
        let filter = Filter::UpdatedAfter(since.as_millisecond());
        self.blocking(move |source| read_contacts(source, Some(filter)))
            .await
    }

    /// Reads the ids of all contacts currently on the device, without details.
    pub async fn read_all_ids(&self) -> Result<HashSet<String>, SourceError> {
        self.blocking(|source| {
            let rows = source
                .query(&Query {
                    table: Table::Contacts,
                    projection: ID_PROJECTION,
                    filter: None,
                    sort: None,
                })?
                .unwrap_or_default();
            Ok(rows.iter().filter_map(|r| r.text(columns::ID)).collect())
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DeviceSource) -> Result<T, SourceError> + Send + 'static,
    {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || f(source.as_ref()))
            .await
            .map_err(|e| SourceError::Task(e.to_string()))?
    }
}

fn read_contacts(
    source: &dyn DeviceSource,
    filter: Option<Filter>,
) -> Result<Vec<Contact>, SourceError> {
    let rows = source
        .query(&Query {
            table: Table::Contacts,
            projection: CONTACT_PROJECTION,
            filter,
            sort: Some(Sort::DisplayNameAsc),
        })?
        .unwrap_or_default();

    let mut contacts = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(id) = row.text(columns::ID) else {
            continue;
        };
        let Some(name) = row.text(columns::DISPLAY_NAME) else {
            tracing::trace!(id, "skipping contact without a display name");
            continue;
        };

        let phone_numbers = read_phone_numbers(source, &id)?;
        let Some(primary) = phone_numbers.first() else {
            tracing::trace!(id, "skipping contact without a phone number");
            continue;
        };

        contacts.push(Contact {
            phone_number: primary.number.clone(),
            is_favorite: row.integer(columns::STARRED) > 0,
            emails: read_emails(source, &id)?,
            addresses: read_addresses(source, &id)?,
            phone_numbers,
            name,
            id,
        });
    }

    Ok(contacts)
}

fn read_details(
    source: &dyn DeviceSource,
    table: Table,
    contact_id: &str,
) -> Result<Vec<(String, i64)>, SourceError> {
    let rows = source
        .query(&Query {
            table,
            projection: DETAIL_PROJECTION,
            filter: Some(Filter::ContactId(contact_id.to_string())),
            sort: None,
        })?
        .unwrap_or_default();

    Ok(rows.iter().filter_map(detail).collect())
}

fn detail(row: &Row) -> Option<(String, i64)> {
    Some((row.text(columns::DATA)?, row.integer(columns::TYPE)))
}

fn read_phone_numbers(
    source: &dyn DeviceSource,
    contact_id: &str,
) -> Result<Vec<PhoneNumber>, SourceError> {
    Ok(read_details(source, Table::Phones, contact_id)?
        .into_iter()
        .map(|(number, code)| PhoneNumber {
            number: format_phone_number(&number),
            kind: PhoneType::from_code(code),
        })
        .collect())
}

fn read_emails(source: &dyn DeviceSource, contact_id: &str) -> Result<Vec<Email>, SourceError> {
    Ok(read_details(source, Table::Emails, contact_id)?
        .into_iter()
        .map(|(address, code)| Email {
            address,
            kind: EmailType::from_code(code),
        })
        .collect())
}

fn read_addresses(
    source: &dyn DeviceSource,
    contact_id: &str,
) -> Result<Vec<Address>, SourceError> {
    Ok(read_details(source, Table::PostalAddresses, contact_id)?
        .into_iter()
        .map(|(address, code)| Address {
            address,
            kind: AddressType::from_code(code),
        })
        .collect())
}
