//! Pure client-side engine for a one-night social-deduction room: the
//! authoritative-snapshot store, the phase gate, the target-composition
//! state machine, the per-viewer log projection and the host/presence
//! reconciler. No IO lives here; the `client` crate owns the channel.

pub mod composer;
pub mod gate;
pub mod logs;
pub mod presence;
pub mod protocol;
pub mod store;
pub mod types;

pub use composer::{ActionComposer, Click, ClickOutcome};
pub use gate::{can_act, can_vote, VoteGate};
pub use logs::{project_logs, LogLine};
pub use presence::{offline_players, Presence};
pub use protocol::{
    Ack, ClientFrame, NightActionData, NightTarget, RequestPayload, ServerFrame, ServerPush,
};
pub use store::{Applied, RoomState};
pub use types::{
    Ability, Avatar, GameState, MajorPhase, Player, Role, SubPhase, TargetKind,
};
