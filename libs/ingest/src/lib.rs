mod adapter;
mod feed;

pub use adapter::IngestAdapter;
pub use feed::spawn_feed_task;
