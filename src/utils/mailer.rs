use serde::Serialize;

/// Rendered email handed to the delivery webhook. Template rendering is the
/// webhook's concern; we only assemble the payload.
#[derive(Debug, Clone, Serialize)]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Best-effort email sender. Posts the payload to a configured webhook and
/// swallows every failure; booking flows must never depend on delivery.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Mailer {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// Fire-and-forget dispatch on a background task.
    pub fn send_in_background(&self, payload: EmailPayload) {
        let mailer = self.clone();
        tokio::spawn(async move {
            mailer.send(payload).await;
        });
    }

    async fn send(&self, payload: EmailPayload) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(to = %payload.to, subject = %payload.subject, "email webhook not configured, skipping");
            return;
        };

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(to = %payload.to, subject = %payload.subject, "email dispatched");
            }
            Ok(response) => {
                tracing::warn!(
                    to = %payload.to,
                    status = %response.status(),
                    "email webhook rejected payload"
                );
            }
            Err(err) => {
                tracing::warn!(to = %payload.to, error = %err, "email dispatch failed");
            }
        }
    }
}

/// Confirmation email for a booking group of `leg_count` legs.
pub fn confirmation_email(
    to: &str,
    full_name: &str,
    booking_code: &str,
    leg_count: usize,
    total_price: &str,
) -> EmailPayload {
    let legs = if leg_count == 1 {
        "1 journey".to_string()
    } else {
        format!("{} journeys", leg_count)
    };

    EmailPayload {
        to: to.to_string(),
        subject: format!("Booking {} confirmed", booking_code),
        body: format!(
            "Dear {},\n\nYour booking {} ({}) is confirmed. Total: {}.\n\nSafe travels!",
            full_name, booking_code, legs, total_price
        ),
    }
}

/// Cancellation email covering every cancelled leg of a group.
pub fn cancellation_email(
    to: &str,
    full_name: &str,
    booking_code: &str,
    cancelled_legs: usize,
) -> EmailPayload {
    let detail = if cancelled_legs == 1 {
        "has been cancelled".to_string()
    } else {
        format!("and all {} legs have been cancelled", cancelled_legs)
    };

    EmailPayload {
        to: to.to_string(),
        subject: format!("Booking {} cancelled", booking_code),
        body: format!("Dear {},\n\nYour booking {} {}.", full_name, booking_code, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_email_summarizes_the_group() {
        let email = confirmation_email("a@b.rw", "Alice", "BK123", 3, "RWF 15000");

        assert_eq!(email.to, "a@b.rw");
        assert!(email.subject.contains("BK123"));
        assert!(email.body.contains("3 journeys"));
        assert!(email.body.contains("RWF 15000"));
    }

    #[test]
    fn cancellation_email_counts_legs() {
        let email = cancellation_email("a@b.rw", "Alice", "BK123", 2);
        assert!(email.body.contains("all 2 legs"));

        let single = cancellation_email("a@b.rw", "Alice", "BK123", 1);
        assert!(single.body.contains("has been cancelled"));
    }
}
