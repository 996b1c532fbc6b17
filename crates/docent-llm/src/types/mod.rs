pub mod content;
pub mod message;

pub use content::{Content, ContentPart, ImageDetail, ImageUrl};
pub use message::{Message, Speaker};
