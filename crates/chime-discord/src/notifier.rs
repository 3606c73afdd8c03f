//! Discord delivery of fired reminders.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::{Http, HttpError};
use serenity::model::id::ChannelId;
use tracing::debug;

use chime_core::{Clock, DeliveryError, Notification, Notifier};

use crate::embed::notification_embed;

/// Posts reminder embeds into the destination channel.
///
/// Uses the REST client only, so it works before the gateway connects and
/// across reconnects.
pub struct DiscordNotifier {
    http: Arc<Http>,
    clock: Arc<dyn Clock>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>, clock: Arc<dyn Clock>) -> Self {
        Self { http, clock }
    }

    pub fn from_token(token: &str, clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(Http::new(token)), clock)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let channel = notification.destination.0;
        // Snowflakes are never zero; ChannelId::new would panic.
        if channel == 0 {
            return Err(DeliveryError::DestinationNotFound(channel));
        }

        let embed = notification_embed(notification, self.clock.now());
        let message = CreateMessage::new().embed(embed.to_create_embed());

        debug!(reminder_id = %notification.reminder_id, channel, "discord: delivering reminder");

        ChannelId::new(channel)
            .send_message(&self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| delivery_error(channel, e))
    }
}

fn delivery_error(channel: u64, err: serenity::Error) -> DeliveryError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)) = err {
        match response.status_code.as_u16() {
            404 => return DeliveryError::DestinationNotFound(channel),
            403 => return DeliveryError::Forbidden(response.error.message.clone()),
            _ => {}
        }
    }
    DeliveryError::Transport(err.to_string())
}
