// File: drkearn-core/src/services/discord/mod.rs

pub mod command_service;
pub mod components;
pub mod embeds;
pub mod interaction;
pub mod permissions;

use twilight_model::channel::message::{Component, Embed};

pub use command_service::{CommandRequest, DiscordCommandService, EarnCommand};

/// A channel message to send back, independent of the HTTP client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageReply {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
}

impl MessageReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }
}
