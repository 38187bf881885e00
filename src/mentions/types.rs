use serde::{Deserialize, Serialize};

/// Cache key of the user pool.
pub const USERS_CACHE_KEY: &str = "users_for_mentions";
/// Cache key of the group pool.
pub const GROUPS_CACHE_KEY: &str = "user_groups";

pub const USER_DOCTYPE: &str = "User";
pub const USER_GROUP_DOCTYPE: &str = "User Group";
/// Form that individual candidates link to.
pub const USER_PROFILE_DOCTYPE: &str = "User Profile";

/// Built-in accounts that are never offered as mentions.
pub const RESERVED_USERS: [&str; 2] = ["Administrator", "Guest"];

/// A user or group offered by @mention autocomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionCandidate {
    pub id: String,
    /// Display name; the field matched and sorted on.
    pub value: String,
    #[serde(default)]
    pub is_group: bool,
    /// Form URL, filled in when the candidate is returned.
    #[serde(default)]
    pub link: String,
}
