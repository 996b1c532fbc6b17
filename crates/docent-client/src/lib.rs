//! Client side of the chat event stream.
//!
//! [`ChatConsumer`] opens a stream through a [`ChatTransport`], decodes the
//! `data: {json}` lines as they arrive and folds each event into a
//! [`ConsumerState`] that a UI can watch.

pub mod consumer;
pub mod error;
pub mod state;
pub mod transport;

pub use consumer::{ChatConsumer, SendOutcome};
pub use error::ClientError;
pub use state::ConsumerState;
pub use transport::{ChatTransport, HttpTransport, StreamReader};
