use serde::{Deserialize, Serialize};

use crate::types::{Avatar, GameState, Player, PlayerId, Role, Username};

/// One resolved target of a night action. Players are addressed by display
/// name (stable across reconnects), deck cards by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum NightTarget {
    Player(Username),
    Deck(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightActionData {
    #[serde(default)]
    pub target1: Option<NightTarget>,
    #[serde(default)]
    pub target2: Option<NightTarget>,
}

/// Every request the client can issue, tagged by event name on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RequestPayload {
    JoinRoom {
        room: String,
        username: Username,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<Avatar>,
    },
    CreateRoom {
        id: String,
        username: Username,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<Avatar>,
    },
    JoinGame {
        room: String,
        username: Username,
        index: usize,
    },
    UpdateRoles {
        room: String,
        roles: Vec<Role>,
    },
    RemovePlayer {
        room: String,
        index: usize,
    },
    LeaveRoom {
        room: String,
        username: Username,
    },
    StartGame {
        room: String,
    },
    NightAction {
        room: String,
        action: String,
        data: NightActionData,
    },
    NextPhase {
        room: String,
    },
    Vote {
        room: String,
        #[serde(rename = "targetId")]
        target_id: String,
    },
    ResetGame {
        room: String,
    },
    UpdatePlayer {
        room: String,
        player: Player,
    },
}

impl RequestPayload {
    /// Wire event name, for logging.
    pub fn event(&self) -> &'static str {
        match self {
            RequestPayload::JoinRoom { .. } => "joinRoom",
            RequestPayload::CreateRoom { .. } => "createRoom",
            RequestPayload::JoinGame { .. } => "joinGame",
            RequestPayload::UpdateRoles { .. } => "updateRoles",
            RequestPayload::RemovePlayer { .. } => "removePlayer",
            RequestPayload::LeaveRoom { .. } => "leaveRoom",
            RequestPayload::StartGame { .. } => "startGame",
            RequestPayload::NightAction { .. } => "nightAction",
            RequestPayload::NextPhase { .. } => "nextPhase",
            RequestPayload::Vote { .. } => "vote",
            RequestPayload::ResetGame { .. } => "resetGame",
            RequestPayload::UpdatePlayer { .. } => "updatePlayer",
        }
    }
}

pub const ACK_OK: &str = "ok";

/// The single acknowledgement shape; which optional facets are filled
/// depends on the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Ack {
            status: ACK_OK.to_string(),
            ..Ack::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ACK_OK
    }

    /// Server-provided rejection text, surfaced verbatim.
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "request failed".to_string())
    }
}

/// Server-initiated pushes. Each replaces exactly one facet of the room
/// state; see `store::RoomState::apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerPush {
    UpdatePlayers {
        players: Vec<Player>,
    },
    UpdateRoles {
        roles: Vec<Role>,
    },
    UpdateHost {
        host: PlayerId,
    },
    /// Host migration: the receiving client is the new host.
    NewHost,
    #[serde(rename_all = "camelCase")]
    GameStarted {
        game_state: GameState,
    },
    #[serde(rename_all = "camelCase")]
    UpdateGameState {
        game_state: GameState,
    },
    ActionDenied {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    RestartGame {
        game_state: GameState,
    },
}

/// Outbound frame. Requests expecting an acknowledgement carry an id the
/// server echoes back; fire-and-forget requests omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub payload: RequestPayload,
}

/// Inbound frame: either an acknowledgement matched to a request id, or a
/// server push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Ack { id: u64, ack: Ack },
    Push(ServerPush),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn night_action_matches_wire_shape() {
        let frame = ClientFrame {
            id: Some(7),
            payload: RequestPayload::NightAction {
                room: "r1".into(),
                action: "view".into(),
                data: NightActionData {
                    target1: Some(NightTarget::Player("alice".into())),
                    target2: Some(NightTarget::Deck(1)),
                },
            },
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "event": "nightAction",
                "room": "r1",
                "action": "view",
                "data": {
                    "target1": { "type": "player", "name": "alice" },
                    "target2": { "type": "deck", "name": 1 },
                }
            })
        );
    }

    #[test]
    fn vote_uses_camel_case_target_id() {
        let value = serde_json::to_value(RequestPayload::Vote {
            room: "r1".into(),
            target_id: "bob".into(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "event": "vote", "room": "r1", "targetId": "bob" })
        );
    }

    #[test]
    fn server_frames_split_into_acks_and_pushes() {
        let ack: ServerFrame = serde_json::from_value(json!({
            "id": 3,
            "ack": { "status": "ok", "host": "c1" }
        }))
        .unwrap();
        match ack {
            ServerFrame::Ack { id, ack } => {
                assert_eq!(id, 3);
                assert!(ack.is_ok());
                assert_eq!(ack.host.as_deref(), Some("c1"));
            }
            other => panic!("expected ack frame, got {other:?}"),
        }

        let push: ServerFrame = serde_json::from_value(json!({
            "event": "actionDenied",
            "message": "not your turn"
        }))
        .unwrap();
        assert_eq!(
            push,
            ServerFrame::Push(ServerPush::ActionDenied {
                message: "not your turn".into()
            })
        );
    }
}
