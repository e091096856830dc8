use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use room_core::types::{Avatar, PlayerId, Role};

/// Prefix of synthesized display names.
pub const NAME_PREFIX: &str = "player";
/// Most-recently-joined room list cap.
pub const RECENT_ROOM_CAP: usize = 5;

/// Local identity, constructed once and passed by reference into the room
/// controller. Never read ambiently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub avatar: Option<Avatar>,
}

/// Low-collision random display name: fixed prefix, two letters, two digits.
pub fn random_username() -> String {
    let mut rng = rand::thread_rng();
    let letters: String = (0..2).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    let digits: String = (0..2).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect();
    format!("{NAME_PREFIX}{letters}{digits}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRoom {
    pub room_id: String,
    pub join_time: u64,
}

/// Everything persisted locally. Best-effort rejoin hints only; none of it
/// is authoritative and all of it is replaceable by the next join.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedState {
    username: Option<String>,
    avatar: Option<Avatar>,
    room_id: Option<String>,
    host: Option<PlayerId>,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    recent_rooms: Vec<RecentRoom>,
}

/// JSON-file-backed session persistence. Load and save are explicit; IO
/// failures are logged and swallowed so a broken disk never blocks play.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    state: SavedState,
}

impl SessionStore {
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable session file: {e}");
                SavedState::default()
            }),
            Err(_) => SavedState::default(),
        };
        Self { path, state }
    }

    pub async fn save(&self) {
        match serde_json::to_vec_pretty(&self.state) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&self.path, json).await {
                    tracing::warn!("failed to persist session: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to serialize session: {e}"),
        }
    }

    /// The persisted identity, synthesizing and recording a fresh display
    /// name on first use.
    pub fn session(&mut self) -> Session {
        let username = match &self.state.username {
            Some(name) => name.clone(),
            None => {
                let name = random_username();
                self.state.username = Some(name.clone());
                name
            }
        };
        Session {
            username,
            avatar: self.state.avatar.clone(),
        }
    }

    pub fn set_avatar(&mut self, avatar: Avatar) {
        self.state.avatar = Some(avatar);
    }

    /// Record rejoin hints from a successful join.
    pub fn remember_join(&mut self, room_id: &str, host: &str, roles: &[Role]) {
        self.state.room_id = Some(room_id.to_string());
        self.state.host = Some(host.to_string());
        self.state.roles = roles.to_vec();
        self.remember_room(room_id);
    }

    /// Front-insert into the recent-room list, superseding any entry for the
    /// same room and keeping at most `RECENT_ROOM_CAP` entries.
    pub fn remember_room(&mut self, room_id: &str) {
        self.state.recent_rooms.retain(|r| r.room_id != room_id);
        self.state.recent_rooms.insert(
            0,
            RecentRoom {
                room_id: room_id.to_string(),
                join_time: now_millis(),
            },
        );
        self.state.recent_rooms.truncate(RECENT_ROOM_CAP);
    }

    /// Drop a room that rejected us from the recent list.
    pub fn forget_room(&mut self, room_id: &str) {
        self.state.recent_rooms.retain(|r| r.room_id != room_id);
    }

    pub fn recent_rooms(&self) -> &[RecentRoom] {
        &self.state.recent_rooms
    }

    pub fn last_room(&self) -> Option<&str> {
        self.state.room_id.as_deref()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
