// Adapters layer: concrete implementations of the domain ports that talk to the outside world.

pub mod feed;

pub use feed::{FeedLocation, FileFeedSource, HttpFeedSource};
