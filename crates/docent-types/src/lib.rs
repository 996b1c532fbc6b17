pub mod events;
pub mod passage;
pub mod request;
pub mod turn;

pub use events::{EventKind, StreamEvent, WireError, EVENT_PREFIX};
pub use passage::RetrievedPassage;
pub use request::{ChatRequestBody, ResponseStyle, SessionRequest};
pub use turn::{ChatTurn, EditRecord, Role, TurnMetadata};
