//! Async side of the room engine: the WebSocket channel adapter, session
//! bootstrap and local rejoin hints, and the controller that turns UI
//! gestures into requests and server pushes into state replacement.

pub mod channel;
pub mod room;
pub mod session;

pub use channel::{Channel, ChannelError, WsChannel};
pub use room::{Notice, RoomController, RoomError};
pub use session::{random_username, Session, SessionStore};
