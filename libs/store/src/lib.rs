mod message;
mod store;

pub use message::Message;
pub use store::{MessageStore, StoreSnapshot};
