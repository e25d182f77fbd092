pub mod feed;
pub mod stream;
pub mod types;

pub use feed::AlertFeed;
pub use stream::{AlertStreamClient, ReconnectPolicy};
pub use types::{AlertEvent, ConnectionStatus};
