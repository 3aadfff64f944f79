// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use colored::Color;
use contactsync_core::Contact;

use crate::arg::OutputFormat;
use crate::table::{Column, PaddingDirection, Table};

#[derive(Debug)]
pub struct ContactFormatter {
    columns: Vec<ContactColumn>,
    format: OutputFormat,
}

impl ContactFormatter {
    pub fn new(verbose: bool) -> Self {
        let mut columns = vec![
            ContactColumn::Id,
            ContactColumn::Favorite,
            ContactColumn::Name,
            ContactColumn::Phone,
        ];
        if verbose {
            columns.push(ContactColumn::OtherPhones);
            columns.push(ContactColumn::Email);
        }

        Self {
            columns,
            format: OutputFormat::Table,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format<'a>(&'a self, contacts: &'a [Contact]) -> Display<'a> {
        Display {
            contacts,
            formatter: self,
        }
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    contacts: &'a [Contact],
    formatter: &'a ContactFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formatter.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(self.contacts).map_err(|_| fmt::Error)?;
                writeln!(f, "{json}")
            }
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(&self.formatter.columns, self.contacts).with_header(true)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactColumn {
    Id,
    Favorite,
    Name,
    Phone,
    OtherPhones,
    Email,
}

impl Column<Contact> for ContactColumn {
    fn name(&self) -> Cow<'_, str> {
        match self {
            ContactColumn::Id => "ID",
            ContactColumn::Favorite => "★",
            ContactColumn::Name => "Name",
            ContactColumn::Phone => "Phone",
            ContactColumn::OtherPhones => "Other Phones",
            ContactColumn::Email => "Email",
        }
        .into()
    }

    fn format<'a>(&self, contact: &'a Contact) -> Cow<'a, str> {
        match self {
            ContactColumn::Id => contact.id.as_str().into(),
            ContactColumn::Favorite => match contact.is_favorite {
                true => "★".into(),
                false => "".into(),
            },
            ContactColumn::Name => contact.name.as_str().into(),
            ContactColumn::Phone => contact.phone_number.as_str().into(),
            ContactColumn::OtherPhones => contact
                .phone_numbers
                .iter()
                .skip(1)
                .map(|p| p.number.as_str())
                .collect::<Vec<_>>()
                .join(", ")
                .into(),
            ContactColumn::Email => contact
                .emails
                .first()
                .map_or("", |e| e.address.as_str())
                .into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            ContactColumn::Id => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn get_color(&self, contact: &Contact) -> Option<Color> {
        match self {
            ContactColumn::Favorite if contact.is_favorite => Some(Color::Yellow),
            ContactColumn::Id => Some(Color::BrightBlack),
            _ => None,
        }
    }
}
