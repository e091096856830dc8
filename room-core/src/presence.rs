use crate::store::RoomState;
use crate::types::{Player, PlayerId};

/// Tracks which connection holds the host seat relative to the local
/// identity. Host status gates role editing and phase advancement in the UI
/// only; the server re-checks every host request.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    self_id: PlayerId,
}

impl Presence {
    pub fn new(self_id: PlayerId) -> Self {
        Self { self_id }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// The server reassigned our connection id (reconnect).
    pub fn rebind(&mut self, self_id: PlayerId) {
        self.self_id = self_id;
    }

    pub fn is_host(&self, room: &RoomState) -> bool {
        !self.self_id.is_empty() && room.host == self.self_id
    }

    /// Host migration push: the prior host disconnected and the server chose
    /// this client. Takes over the host facet without any user action.
    pub fn take_over(&self, room: &mut RoomState) {
        room.host = self.self_id.clone();
    }
}

/// Seats currently flagged disconnected, independent of game progress.
pub fn offline_players(players: &[Player]) -> Vec<&Player> {
    players.iter().filter(|p| p.offline).collect()
}
