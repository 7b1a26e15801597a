//! Background notification worker.
//!
//! Subscribes to the event bus and emails each event's recipients. Delivery
//! is strictly fire-and-forget: a failed or lagged delivery is logged and
//! never affects the operation that published the event.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tutorlane_events::{EmailConfig, EmailDelivery, EventBus};

/// Spawn the notification worker. Returns immediately; the worker runs for
/// the life of the process.
///
/// When SMTP is not configured (`config` is `None`), events are drained and
/// logged only.
pub fn spawn_notifier(bus: Arc<EventBus>, config: Option<EmailConfig>) {
    let delivery = config.map(EmailDelivery::new);
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification worker lagged; events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(delivery) = &delivery else {
                tracing::debug!(
                    event_type = %event.event_type,
                    "SMTP not configured; skipping notification"
                );
                continue;
            };

            for recipient in &event.recipients {
                if let Err(err) = delivery.deliver(recipient, &event).await {
                    tracing::warn!(
                        to = %recipient,
                        event_type = %event.event_type,
                        error = %err,
                        "Notification email failed"
                    );
                }
            }
        }
    });
}
