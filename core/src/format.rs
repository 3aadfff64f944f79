// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Normalizes a phone number read from the device.
///
/// Numbers in international form (leading `+`) are kept as they are. A number
/// with exactly ten digits is grouped as `(AAA) BBB-CCCC`, ignoring any other
/// characters. Everything else is returned trimmed.
pub fn format_phone_number(phone: &str) -> String {
    let original = phone.trim();
    if original.starts_with('+') {
        return original.to_string();
    }

    let digits: String = original.chars().filter(char::is_ascii_digit).collect();
    match (digits.get(0..3), digits.get(3..6), digits.get(6..)) {
        (Some(area), Some(prefix), Some(line)) if digits.len() == 10 => {
            format!("({area}) {prefix}-{line}")
        }
        _ => original.to_string(),
    }
}
