// File: src/services/mod.rs

pub mod earn_service;
pub mod offer_registry;
pub mod discord;

pub use earn_service::EarnService;
pub use offer_registry::OfferRegistry;
pub use discord::DiscordCommandService;
