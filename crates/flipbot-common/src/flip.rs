// Flipbot
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};

const APPROVE_PREFIX: &str = "flip:approve:";
const REJECT_PREFIX: &str = "flip:reject:";

/// Raw text collected by the submission form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlipForm {
    pub item: String,
    #[serde(default)]
    pub purchase_price: String,
    #[serde(default)]
    pub parts_price: String,
    #[serde(default)]
    pub sales_price: String,
}

/// What the gateway still knows about a flip when a moderator clicks one of
/// its buttons. `id` is missing when the submission never got its row id
/// back; the record is then looked up by guild, user and item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlipPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub guild_id: i64,
    pub user_id: i64,
    pub item: String,
    #[serde(default)]
    pub profit: Option<String>,
    #[serde(default)]
    pub member_message_id: Option<i64>,
}

pub fn approve_custom_id(flip_id: &str) -> String {
    format!("{APPROVE_PREFIX}{flip_id}")
}

pub fn reject_custom_id(flip_id: &str) -> String {
    format!("{REJECT_PREFIX}{flip_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_embed_the_flip_id_in_button_ids() {
        let id = "0b6c3a5e-2f7d-4a43-9b0e-6f1f3c1d2e4a";
        assert_eq!(
            approve_custom_id(id),
            "flip:approve:0b6c3a5e-2f7d-4a43-9b0e-6f1f3c1d2e4a"
        );
        assert_eq!(
            reject_custom_id(id),
            "flip:reject:0b6c3a5e-2f7d-4a43-9b0e-6f1f3c1d2e4a"
        );
    }
}
