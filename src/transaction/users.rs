//! The people that transactions belong to, as shown in the user filter.

use serde::Serialize;

use crate::transaction::query::format_user_name;

/// A user ID with the name to display for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// The user ID, e.g. "user_001".
    pub id: String,
    /// The formatted name, e.g. "User 001".
    pub display_name: String,
}

impl UserSummary {
    /// Pair `id` with its display name.
    pub fn new(id: String) -> Self {
        let display_name = format_user_name(&id);

        Self { id, display_name }
    }
}
