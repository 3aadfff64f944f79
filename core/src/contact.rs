// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// A contact as mirrored from the device contact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable identifier, taken from the device row id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// The formatted first phone number.
    pub phone_number: String,

    /// Whether the contact is starred on the device.
    pub is_favorite: bool,

    /// All phone numbers in device order.
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,

    /// Email addresses.
    #[serde(default)]
    pub emails: Vec<Email>,

    /// Postal addresses.
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// A phone number with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// The number, already normalized.
    pub number: String,

    /// Kind of the number.
    #[serde(rename = "type")]
    pub kind: PhoneType,
}

/// Kind of a phone number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhoneType {
    /// Home phone.
    Home,

    /// Mobile phone.
    Mobile,

    /// Work phone.
    Work,

    /// Anything else.
    #[default]
    Other,
}

impl PhoneType {
    /// Maps a device type code to a phone type.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PhoneType::Home,
            2 => PhoneType::Mobile,
            3 => PhoneType::Work,
            _ => PhoneType::Other,
        }
    }

    /// The device type code of this phone type.
    pub fn code(self) -> i64 {
        match self {
            PhoneType::Home => 1,
            PhoneType::Mobile => 2,
            PhoneType::Work => 3,
            PhoneType::Other => 7,
        }
    }
}

/// An email address with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// The address.
    pub address: String,

    /// Kind of the address.
    #[serde(rename = "type")]
    pub kind: EmailType,
}

/// Kind of an email address.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmailType {
    /// Personal address, stored as "home" on the device.
    Personal,

    /// Work address.
    Work,

    /// Anything else.
    #[default]
    Other,
}

impl EmailType {
    /// Maps a device type code to an email type.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => EmailType::Personal,
            2 => EmailType::Work,
            _ => EmailType::Other,
        }
    }

    /// The device type code of this email type.
    pub fn code(self) -> i64 {
        match self {
            EmailType::Personal => 1,
            EmailType::Work => 2,
            EmailType::Other => 3,
        }
    }
}

/// A postal address with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The formatted, possibly multi-line address.
    pub address: String,

    /// Kind of the address.
    #[serde(rename = "type")]
    pub kind: AddressType,
}

/// Kind of a postal address.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressType {
    /// Home address.
    Home,

    /// Work address.
    Work,

    /// Anything else.
    #[default]
    Other,
}

impl AddressType {
    /// Maps a device type code to an address type.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => AddressType::Home,
            2 => AddressType::Work,
            _ => AddressType::Other,
        }
    }

    /// The device type code of this address type.
    pub fn code(self) -> i64 {
        match self {
            AddressType::Home => 1,
            AddressType::Work => 2,
            AddressType::Other => 3,
        }
    }
}
