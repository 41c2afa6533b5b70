// File: drkearn-core/src/services/discord/components.rs

use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};

use crate::services::offer_registry::OfferAction;

fn button(label: String, style: ButtonStyle, action: &OfferAction, disabled: bool) -> Component {
    Component::Button(Button {
        custom_id: Some(action.custom_id()),
        disabled,
        emoji: None,
        label: Some(label),
        style,
        url: None,
        sku_id: None,
    })
}

/// One "Watch Ad N" button per offered slot, in a single row.
pub fn watch_buttons(offers: &[(i64, OfferAction)]) -> Vec<Component> {
    if offers.is_empty() {
        return Vec::new();
    }
    let buttons = offers
        .iter()
        .map(|(ad_number, action)| {
            button(format!("Watch Ad {ad_number}"), ButtonStyle::Success, action, false)
        })
        .collect();
    vec![Component::ActionRow(ActionRow { components: buttons })]
}

pub fn verify_button(action: &OfferAction, disabled: bool) -> Vec<Component> {
    vec![Component::ActionRow(ActionRow {
        components: vec![button(
            "✅ I Watched the Ad".to_string(),
            ButtonStyle::Primary,
            action,
            disabled,
        )],
    })]
}
