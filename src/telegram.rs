pub mod client;
pub mod gateway;
pub mod incoming;
pub mod update_fetcher;

pub use client::Api;
pub use gateway::{BotGateway, GatewayError, MessagingGateway, UserGateway};
pub use incoming::{IncomingMessage, MediaKind, MessageSnapshot};
pub use update_fetcher::UpdateFetcher;
