use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Transient connection id assigned by the server per socket.
pub type PlayerId = String;
/// Stable display name, the address key that survives reconnects.
pub type Username = String;

/// Log-map key under which publicly revealable entries are filed.
pub const REVEAL_LOG_KEY: &str = "2";

/// A room always deals this many more cards than there are seats.
pub const DECK_SURPLUS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Player,
    Deck,
}

/// A single night ability: how many targets it takes, of what kind, in
/// what order. An empty slot list means a self-only effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ability {
    pub name: String,
    #[serde(rename = "max")]
    pub max_uses: u8,
    #[serde(rename = "targets")]
    pub target_slots: Vec<TargetKind>,
    #[serde(default = "default_allow_self", rename = "allowSelf")]
    pub allow_self: bool,
}

fn default_allow_self() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub faction: String,
    pub count: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    /// Night sub-phase label during which holders of this role act.
    #[serde(default)]
    pub phase: String,
}

impl Role {
    /// Whether this role takes a turn at night with at least one usable
    /// ability.
    pub fn has_night_ability(&self) -> bool {
        self.abilities.iter().any(|a| a.max_uses > 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub name: String,
    pub img: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub username: Username,
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    /// Current card, after any swaps.
    #[serde(default)]
    pub role: Option<Role>,
    /// Dealt card; governs ability eligibility and log attribution.
    #[serde(default, rename = "initialRole")]
    pub initial_role: Option<Role>,
    #[serde(default, rename = "hasVoted")]
    pub has_voted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorPhase {
    Night,
    Day,
}

/// Night sub-phases carry the acting role's name; Day sub-phases are a
/// fixed trio. The wire encodes both as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubPhase {
    Role(String),
    Discussion,
    Voting,
    Resolution,
}

pub const SUB_PHASE_DISCUSSION: &str = "discussion";
pub const SUB_PHASE_VOTING: &str = "voting";
pub const SUB_PHASE_RESOLUTION: &str = "resolution";

impl From<String> for SubPhase {
    fn from(label: String) -> Self {
        match label.as_str() {
            SUB_PHASE_DISCUSSION => SubPhase::Discussion,
            SUB_PHASE_VOTING => SubPhase::Voting,
            SUB_PHASE_RESOLUTION => SubPhase::Resolution,
            _ => SubPhase::Role(label),
        }
    }
}

impl From<SubPhase> for String {
    fn from(phase: SubPhase) -> Self {
        match phase {
            SubPhase::Role(name) => name,
            SubPhase::Discussion => SUB_PHASE_DISCUSSION.to_string(),
            SubPhase::Voting => SUB_PHASE_VOTING.to_string(),
            SubPhase::Resolution => SUB_PHASE_RESOLUTION.to_string(),
        }
    }
}

/// Shared log feed: outer key is the username the entry is attributed to,
/// inner key is the server's step label (`REVEAL_LOG_KEY` for public
/// entries). Entry vectors keep server insertion order.
pub type LogMap = HashMap<Username, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub player_name: Username,
    pub target_name: Username,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionInfo {
    #[serde(default)]
    pub order: Vec<Username>,
    #[serde(default)]
    pub duration_secs: u64,
}

/// The authoritative snapshot pushed by the server. Replaced wholesale on
/// every push; the client never patches it incrementally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub started: bool,
    pub major_phase: MajorPhase,
    pub sub_phase: SubPhase,
    pub players: Vec<Player>,
    /// Role configuration as it stood before the deal; restored on restart.
    #[serde(default)]
    pub pre_roles: Vec<Role>,
    /// Undealt cards, addressable as deck targets by index.
    #[serde(default)]
    pub leftover_cards: Vec<Role>,
    #[serde(default)]
    pub logs: LogMap,
    #[serde(default)]
    pub vote_results: Vec<VoteRecord>,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub discussion_info: DiscussionInfo,
    /// Seconds allotted to the current night action, for the countdown.
    #[serde(default)]
    pub cur_action_time: u64,
}

impl GameState {
    pub fn player(&self, username: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.username == username)
    }

    pub fn player_by_id(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// Configured cards minus seats beyond the fixed surplus. Positive means
/// too many cards are configured; advisory only, the server still decides.
pub fn card_surplus(roles: &[Role], seated: usize) -> i64 {
    let cards: i64 = roles.iter().map(|r| i64::from(r.count)).sum();
    cards - seated as i64 - DECK_SURPLUS as i64
}

/// Warning text for a role table that does not line up with the seated
/// player count, or `None` when the configuration is consistent.
pub fn config_warning(roles: &[Role], seated: usize) -> Option<String> {
    let surplus = card_surplus(roles, seated);
    if surplus == 0 {
        return None;
    }
    let cards: i64 = roles.iter().map(|r| i64::from(r.count)).sum();
    Some(format!(
        "role cards ({cards}) should equal seats ({seated}) plus {DECK_SURPLUS}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, count: u8) -> Role {
        Role {
            name: name.to_string(),
            faction: String::new(),
            count,
            description: String::new(),
            img: String::new(),
            abilities: Vec::new(),
            phase: name.to_string(),
        }
    }

    #[test]
    fn sub_phase_round_trips_through_strings() {
        let night: SubPhase = "werewolf".to_string().into();
        assert_eq!(night, SubPhase::Role("werewolf".into()));
        assert_eq!(String::from(night), "werewolf");

        let voting: SubPhase = "voting".to_string().into();
        assert_eq!(voting, SubPhase::Voting);
        assert_eq!(String::from(SubPhase::Resolution), "resolution");
    }

    #[test]
    fn card_surplus_flags_misconfigured_tables() {
        let roles = vec![role("werewolf", 1), role("villager", 2)];
        // 3 cards for 3 seats is 3 short of seats + surplus.
        assert_eq!(card_surplus(&roles, 3), -3);
        assert!(config_warning(&roles, 3).is_some());
        assert_eq!(config_warning(&roles, 0), None);
    }
}
