//! Push delivery for notifications.
//!
//! Every notification produced by a fan-out is offered to the configured
//! [`PushGateway`] together with all device tokens its recipient registered.
//! Delivery is best effort: gateway failures are logged and never reach the
//! client that triggered the notification.

use std::{collections::BTreeMap, time::Duration};

use quad_core::{notification::Notification, store::NotificationStore};
use serde::Serialize;
use thiserror::Error;

/// How long a single gateway call may take, connect to response.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where push messages go.
#[derive(Debug, Clone, Default)]
pub enum PushGateway {
  /// Push is not configured; nothing is sent.
  #[default]
  Disabled,
  /// `POST` each message as JSON to `url`, giving up after `timeout`.
  Webhook { client: reqwest::Client, url: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum PushError {
  #[error("push gateway request failed: {0}")]
  Http(#[from] reqwest::Error),
}

/// The JSON body sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
  pub tokens: Vec<String>,
  pub title:  &'static str,
  pub body:   String,
  /// String-valued payload, as device push services expect.
  pub data:   BTreeMap<&'static str, String>,
}

impl PushMessage {
  pub fn for_notification(notification: &Notification, tokens: Vec<String>) -> Self {
    let mut data = BTreeMap::new();
    data.insert("type", notification.kind.to_string());
    data.insert("notification_id", notification.id.to_string());
    if let Some(id) = notification.related_object_id {
      data.insert("related_object_id", id.to_string());
    }
    Self {
      tokens,
      title: notification.kind.push_title(),
      body: notification.text.clone(),
      data,
    }
  }
}

impl PushGateway {
  pub fn webhook(url: impl Into<String>) -> Self { Self::webhook_with_timeout(url, PUSH_TIMEOUT) }

  pub fn webhook_with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
    PushGateway::Webhook { client: reqwest::Client::new(), url: url.into(), timeout }
  }

  /// A webhook gateway when `url` is set, otherwise [`PushGateway::Disabled`].
  pub fn from_url(url: Option<String>) -> Self {
    match url {
      Some(url) if !url.trim().is_empty() => Self::webhook(url),
      _ => PushGateway::Disabled,
    }
  }

  pub fn is_enabled(&self) -> bool { !matches!(self, PushGateway::Disabled) }

  pub async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
    match self {
      PushGateway::Disabled => Ok(()),
      PushGateway::Webhook { client, url, timeout } => {
        client
          .post(url)
          .timeout(*timeout)
          .json(message)
          .send()
          .await?
          .error_for_status()?;
        Ok(())
      }
    }
  }
}

/// Push `notification` to every device of its recipient.
///
/// A recipient without tokens gets nothing. Errors are logged and swallowed.
pub async fn deliver<S: NotificationStore>(
  store: &S,
  gateway: &PushGateway,
  notification: &Notification,
) {
  if !gateway.is_enabled() {
    return;
  }

  let tokens = match store.push_tokens(notification.user_id).await {
    Ok(tokens) => tokens,
    Err(e) => {
      tracing::warn!(user_id = notification.user_id, error = %e, "could not load push tokens");
      return;
    }
  };
  if tokens.is_empty() {
    tracing::debug!(user_id = notification.user_id, "no push tokens; skipping push");
    return;
  }

  let message = PushMessage::for_notification(notification, tokens);
  match gateway.send(&message).await {
    Ok(()) => tracing::debug!(
      notification_id = notification.id,
      devices = message.tokens.len(),
      "push delivered"
    ),
    Err(e) => tracing::warn!(notification_id = notification.id, error = %e, "push failed"),
  }
}
