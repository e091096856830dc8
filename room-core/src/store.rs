use crate::protocol::{Ack, ServerPush};
use crate::types::{GameState, Player, PlayerId, Role, SubPhase};

/// The one client-side copy of the authoritative room state. Every facet is
/// replaced wholesale by its push; nothing is ever merged, so the client can
/// never drift from the server.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    pub players: Vec<Player>,
    pub roles: Vec<Role>,
    pub host: PlayerId,
    pub game: Option<GameState>,
}

/// What a push did to the store, for the caller to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Roster,
    Roles,
    Host,
    /// `newHost` push: the store does not know the local identity, the
    /// presence reconciler finishes the takeover.
    HostMigrated,
    Game { sub_phase: SubPhase },
    Restarted,
    Denied { message: String },
}

impl RoomState {
    /// Seed all facets from a join/create acknowledgement.
    pub fn seed(&mut self, ack: &Ack) {
        if let Some(players) = &ack.players {
            self.players = players.clone();
        }
        if let Some(roles) = &ack.roles {
            self.roles = roles.clone();
        }
        if let Some(host) = &ack.host {
            self.host = host.clone();
        }
        self.game = ack.game_state.clone();
    }

    /// Replace the facet the push addresses.
    pub fn apply(&mut self, push: ServerPush) -> Applied {
        match push {
            ServerPush::UpdatePlayers { players } => {
                self.players = players;
                Applied::Roster
            }
            ServerPush::UpdateRoles { roles } => {
                self.roles = roles;
                Applied::Roles
            }
            ServerPush::UpdateHost { host } => {
                self.host = host;
                Applied::Host
            }
            ServerPush::NewHost => Applied::HostMigrated,
            ServerPush::GameStarted { game_state }
            | ServerPush::UpdateGameState { game_state } => {
                let sub_phase = game_state.sub_phase.clone();
                self.game = Some(game_state);
                Applied::Game { sub_phase }
            }
            ServerPush::RestartGame { game_state } => {
                // Back to configuration: the game facet clears and the role
                // table reverts to its pre-deal snapshot.
                self.roles = game_state.pre_roles;
                self.players = game_state.players;
                self.game = None;
                Applied::Restarted
            }
            ServerPush::ActionDenied { message } => Applied::Denied { message },
        }
    }

    /// Seated players: the game snapshot once one exists, the lobby roster
    /// before that.
    pub fn seated(&self) -> &[Player] {
        match &self.game {
            Some(game) => &game.players,
            None => &self.players,
        }
    }

    pub fn sub_phase(&self) -> Option<&SubPhase> {
        self.game.as_ref().map(|g| &g.sub_phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MajorPhase, Role};

    fn player(id: &str, username: &str) -> Player {
        Player {
            id: id.to_string(),
            username: username.to_string(),
            offline: false,
            avatar: None,
            role: None,
            initial_role: None,
            has_voted: false,
        }
    }

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

    fn night_state(sub_phase: &str) -> GameState {
        GameState {
            started: true,
            major_phase: MajorPhase::Night,
            sub_phase: SubPhase::Role(sub_phase.to_string()),
            players: vec![player("c1", "alice"), player("c2", "bob")],
            pre_roles: vec![role("werewolf", 1), role("villager", 2)],
            leftover_cards: Vec::new(),
            logs: Default::default(),
            vote_results: Vec::new(),
            winner: None,
            discussion_info: Default::default(),
            cur_action_time: 30,
        }
    }

    #[test]
    fn game_started_replaces_the_game_facet() {
        let mut room = RoomState::default();
        let applied = room.apply(ServerPush::GameStarted {
            game_state: night_state("werewolf"),
        });

        assert_eq!(
            applied,
            Applied::Game {
                sub_phase: SubPhase::Role("werewolf".into())
            }
        );
        let game = room.game.as_ref().unwrap();
        assert!(game.started);
        assert_eq!(game.major_phase, MajorPhase::Night);
        assert_eq!(game.sub_phase, SubPhase::Role("werewolf".into()));
    }

    #[test]
    fn reapplying_the_same_push_is_idempotent() {
        let mut room = RoomState::default();
        room.apply(ServerPush::GameStarted {
            game_state: night_state("seer"),
        });
        let first = room.game.clone();
        room.apply(ServerPush::UpdateGameState {
            game_state: night_state("seer"),
        });
        assert_eq!(room.game, first);
    }

    #[test]
    fn restart_clears_the_game_and_restores_pre_roles() {
        let mut room = RoomState::default();
        room.roles = vec![role("tanner", 1)];
        room.apply(ServerPush::GameStarted {
            game_state: night_state("werewolf"),
        });

        let applied = room.apply(ServerPush::RestartGame {
            game_state: night_state("werewolf"),
        });

        assert_eq!(applied, Applied::Restarted);
        assert!(room.game.is_none());
        assert_eq!(
            room.roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["werewolf", "villager"]
        );
    }

    #[test]
    fn host_and_roster_facets_replace_independently() {
        let mut room = RoomState::default();
        room.apply(ServerPush::UpdatePlayers {
            players: vec![player("c1", "alice")],
        });
        room.apply(ServerPush::UpdateHost { host: "c1".into() });

        assert_eq!(room.host, "c1");
        assert_eq!(room.players.len(), 1);
        assert!(room.game.is_none());

        // A migration push touches nothing in the store itself.
        let applied = room.apply(ServerPush::NewHost);
        assert_eq!(applied, Applied::HostMigrated);
        assert_eq!(room.host, "c1");
    }
}
