use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Empty for direct and group messages, which belong to no team.
    #[serde(default)]
    pub team_id: String,
}
