use thiserror::Error;

use room_core::composer::{ActionComposer, Click, ClickOutcome};
use room_core::gate;
use room_core::logs::{project_logs, LogLine};
use room_core::presence::Presence;
use room_core::protocol::{Ack, NightActionData, RequestPayload, ServerPush};
use room_core::store::{Applied, RoomState};
use room_core::types::{config_warning, Avatar, Role, SubPhase};

use crate::channel::{Channel, ChannelError};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum RoomError {
    /// Caught before any request is sent.
    #[error("{0}")]
    Validation(&'static str),
    /// Acknowledgement status was not ok; the message is the server's own.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Transient, auto-dismissing UI text. The controller queues them, the view
/// drains them; no failure is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub String);

/// Wires the pure room engine to the channel: pushes replace the store,
/// gestures run through the gate and composer, and every completed
/// composition becomes exactly one request.
pub struct RoomController<C: Channel> {
    channel: C,
    session: Session,
    room: String,
    store: RoomState,
    presence: Presence,
    composer: ActionComposer,
    notices: Vec<Notice>,
}

impl<C: Channel> RoomController<C> {
    pub fn new(channel: C, session: Session) -> Self {
        Self {
            channel,
            session,
            room: String::new(),
            store: RoomState::default(),
            presence: Presence::default(),
            composer: ActionComposer::new(),
            notices: Vec::new(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn state(&self) -> &RoomState {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn room_id(&self) -> &str {
        &self.room
    }

    pub fn is_host(&self) -> bool {
        self.presence.is_host(&self.store)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.notices.push(Notice(text.into()));
    }

    fn validate(&self, room: &str) -> Result<(), RoomError> {
        if self.session.username.trim().is_empty() {
            return Err(RoomError::Validation("username must not be empty"));
        }
        if room.trim().is_empty() {
            return Err(RoomError::Validation("room id must not be empty"));
        }
        Ok(())
    }

    /// Join an existing room and seed every facet from the acknowledgement.
    pub async fn join(&mut self, room: &str) -> Result<(), RoomError> {
        self.validate(room)?;
        let ack = self
            .channel
            .request(RequestPayload::JoinRoom {
                room: room.to_string(),
                username: self.session.username.clone(),
                avatar: self.session.avatar.clone(),
            })
            .await?;
        self.seed_from(room, ack)
    }

    /// Create a room; the creator becomes host.
    pub async fn create(&mut self, room: &str) -> Result<(), RoomError> {
        self.validate(room)?;
        let ack = self
            .channel
            .request(RequestPayload::CreateRoom {
                id: room.to_string(),
                username: self.session.username.clone(),
                avatar: self.session.avatar.clone(),
            })
            .await?;
        self.seed_from(room, ack)
    }

    fn seed_from(&mut self, room: &str, ack: Ack) -> Result<(), RoomError> {
        if !ack.is_ok() {
            return Err(RoomError::Rejected(ack.error_message()));
        }
        self.room = room.to_string();
        self.store.seed(&ack);
        self.presence = Presence::new(self.own_connection_id());
        if let Some(sub_phase) = self.store.sub_phase() {
            let sub_phase = sub_phase.clone();
            self.composer.note_sub_phase(&sub_phase);
        }
        Ok(())
    }

    /// Take the given seat in the roster.
    pub async fn join_seat(&mut self, index: usize) -> Result<(), RoomError> {
        let ack = self
            .channel
            .request(RequestPayload::JoinGame {
                room: self.room.clone(),
                username: self.session.username.clone(),
                index,
            })
            .await?;
        if !ack.is_ok() {
            return Err(RoomError::Rejected(ack.error_message()));
        }
        if let Some(players) = &ack.players {
            self.store.players = players.clone();
        }
        self.store.game = ack.game_state.clone();
        self.presence.rebind(self.own_connection_id());
        Ok(())
    }

    pub async fn leave(&mut self) -> Result<(), RoomError> {
        self.channel
            .send(RequestPayload::LeaveRoom {
                room: self.room.clone(),
                username: self.session.username.clone(),
            })
            .await?;
        Ok(())
    }

    /// Apply one server push in delivery order. Synchronous on purpose:
    /// the store is only ever written here, so pushes can never interleave.
    pub fn handle_push(&mut self, push: ServerPush) {
        match self.store.apply(push) {
            Applied::Game { sub_phase } => {
                self.composer.note_sub_phase(&sub_phase);
                self.presence.rebind(self.own_connection_id());
                if self.can_act_now() {
                    self.notice("it is your turn to act");
                }
            }
            Applied::Restarted => {
                // Back to the configuration screen; nothing composed
                // survives a restart.
                self.composer.discard();
            }
            Applied::HostMigrated => {
                self.presence.take_over(&mut self.store);
                self.notice("you are now the host");
            }
            Applied::Denied { message } => {
                self.composer.discard();
                self.notice(message);
            }
            Applied::Roster | Applied::Roles | Applied::Host => {}
        }
    }

    fn own_connection_id(&self) -> String {
        self.store
            .seated()
            .iter()
            .find(|p| p.username == self.session.username)
            .map(|p| p.id.clone())
            .unwrap_or_default()
    }

    pub fn can_act_now(&self) -> bool {
        self.store
            .game
            .as_ref()
            .is_some_and(|game| gate::can_act(game, &self.session.username))
    }

    /// The viewer-visible slice of the shared log feed.
    pub fn visible_logs(&self) -> Vec<LogLine> {
        let Some(game) = &self.store.game else {
            return Vec::new();
        };
        project_logs(
            &game.logs,
            &game.players,
            &self.session.username,
            &game.sub_phase,
        )
    }

    /// Advisory warning when the role table does not fit the seated count.
    pub fn roster_warning(&self) -> Option<String> {
        let seated = self
            .store
            .players
            .iter()
            .filter(|p| !p.username.is_empty())
            .count();
        config_warning(&self.store.roles, seated)
    }

    /// A click on another player's card during Night.
    pub async fn click_player(&mut self, target: &str) -> Result<(), RoomError> {
        let target = target.to_string();
        self.compose(Click::Player(&target)).await
    }

    /// A click on a leftover deck card during Night.
    pub async fn click_deck(&mut self, index: usize) -> Result<(), RoomError> {
        self.compose(Click::Deck(index)).await
    }

    async fn compose(&mut self, click: Click<'_>) -> Result<(), RoomError> {
        let outcome = match &self.store.game {
            Some(game) => self.composer.click(game, &self.session.username, click),
            None => return Ok(()),
        };
        match outcome {
            ClickOutcome::Ignored | ClickOutcome::Accumulated(_) => Ok(()),
            ClickOutcome::SelfTarget => {
                self.notice("this ability cannot target yourself");
                Ok(())
            }
            ClickOutcome::Flush { action, data } => self.submit_action(action, data).await,
        }
    }

    async fn submit_action(
        &mut self,
        action: String,
        data: NightActionData,
    ) -> Result<(), RoomError> {
        let result = self
            .channel
            .request(RequestPayload::NightAction {
                room: self.room.clone(),
                action,
                data,
            })
            .await;
        match result {
            Ok(ack) if ack.is_ok() => {
                self.composer.finish_request(true);
                self.notice("action submitted");
                Ok(())
            }
            Ok(ack) => {
                self.composer.finish_request(false);
                Err(RoomError::Rejected(ack.error_message()))
            }
            Err(e) => {
                self.composer.finish_request(false);
                Err(e.into())
            }
        }
    }

    /// Cast a ballot. Blocked locally after the first ballot; the notice
    /// matches what the server would say anyway.
    pub async fn vote(&mut self, target_id: &str) -> Result<(), RoomError> {
        let Some(game) = &self.store.game else {
            return Ok(());
        };
        if let Err(block) = gate::can_vote(game, &self.session.username) {
            let text = block.to_string();
            self.notice(text);
            return Ok(());
        }
        let ack = self
            .channel
            .request(RequestPayload::Vote {
                room: self.room.clone(),
                target_id: target_id.to_string(),
            })
            .await?;
        if !ack.is_ok() {
            return Err(RoomError::Rejected(ack.error_message()));
        }
        Ok(())
    }

    /// Host-only controls. Silently no-ops for non-hosts, the same advisory
    /// stance as the gate: the server re-checks regardless.
    pub async fn start_game(&mut self) -> Result<(), RoomError> {
        if !self.is_host() {
            return Ok(());
        }
        let ack = self
            .channel
            .request(RequestPayload::StartGame {
                room: self.room.clone(),
            })
            .await?;
        if !ack.is_ok() {
            return Err(RoomError::Rejected(ack.error_message()));
        }
        if let Some(roles) = ack.roles {
            self.store.roles = roles;
        }
        Ok(())
    }

    pub async fn next_phase(&mut self) -> Result<(), RoomError> {
        if !self.is_host() {
            return Ok(());
        }
        self.channel
            .send(RequestPayload::NextPhase {
                room: self.room.clone(),
            })
            .await?;
        Ok(())
    }

    pub async fn reset_game(&mut self) -> Result<(), RoomError> {
        if !self.is_host() {
            return Ok(());
        }
        self.channel
            .send(RequestPayload::ResetGame {
                room: self.room.clone(),
            })
            .await?;
        Ok(())
    }

    pub async fn update_roles(&mut self, roles: Vec<Role>) -> Result<(), RoomError> {
        if !self.is_host() {
            return Ok(());
        }
        self.channel
            .send(RequestPayload::UpdateRoles {
                room: self.room.clone(),
                roles,
            })
            .await?;
        Ok(())
    }

    pub async fn remove_player(&mut self, index: usize) -> Result<(), RoomError> {
        if !self.is_host() {
            return Ok(());
        }
        self.channel
            .send(RequestPayload::RemovePlayer {
                room: self.room.clone(),
                index,
            })
            .await?;
        Ok(())
    }

    /// Change our own avatar and broadcast it.
    pub async fn update_avatar(&mut self, avatar: Avatar) -> Result<(), RoomError> {
        self.session.avatar = Some(avatar.clone());
        let Some(mut player) = self
            .store
            .seated()
            .iter()
            .find(|p| p.username == self.session.username)
            .cloned()
        else {
            return Ok(());
        };
        player.avatar = Some(avatar);
        self.channel
            .send(RequestPayload::UpdatePlayer {
                room: self.room.clone(),
                player,
            })
            .await?;
        Ok(())
    }

    /// Night roles still configured, in acting order, for the phase strip.
    pub fn night_order(&self) -> Vec<&str> {
        self.store
            .roles
            .iter()
            .filter(|r| r.count > 0 && r.has_night_ability())
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn sub_phase(&self) -> Option<&SubPhase> {
        self.store.sub_phase()
    }
}
