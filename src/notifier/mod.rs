use std::fmt;

use chrono::NaiveDate;
use sea_orm::prelude::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::entities::booking::BookingType;

/// Remaining-seat counts at or below these trigger a warning to schedule
/// watchers.
pub const LOW_SEAT_THRESHOLD: usize = 10;
pub const CRITICAL_SEAT_THRESHOLD: usize = 5;

/// A pub/sub channel address. Clients join schedule and route topics
/// explicitly; the user topic is assigned when an authenticated client
/// connects, and the broadcast topic reaches everyone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    User(i32),
    Schedule(i32),
    Route(i32),
    Broadcast,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::User(id) => write!(f, "user:{}", id),
            Topic::Schedule(id) => write!(f, "schedule:{}", id),
            Topic::Route(id) => write!(f, "route:{}", id),
            Topic::Broadcast => write!(f, "broadcast"),
        }
    }
}

impl Topic {
    /// Parse a client-supplied topic string. Only schedule and route topics
    /// can be joined on request; `user:*` membership comes from
    /// authentication, never from a subscribe message.
    pub fn parse_subscribable(raw: &str) -> Option<Topic> {
        let (kind, id) = raw.split_once(':')?;
        let id: i32 = id.parse().ok()?;

        match kind {
            "schedule" => Some(Topic::Schedule(id)),
            "route" => Some(Topic::Route(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningPriority {
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementPriority {
    Low,
    Medium,
    High,
}

/// One leg of a confirmed booking group, as shown to the owning user.
#[derive(Debug, Clone, Serialize)]
pub struct LegSummary {
    pub booking_code: String,
    pub schedule_id: i32,
    pub travel_date: NaiveDate,
    pub seat_number: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
}

/// Before/after values for the mutable schedule fields watchers care about.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<Change<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<Change<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Change<Decimal>>,
}

impl ScheduleChanges {
    pub fn is_empty(&self) -> bool {
        self.departure_time.is_none() && self.arrival_time.is_none() && self.price.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    BookingConfirmed {
        booking_code: String,
        booking_type: BookingType,
        legs: Vec<LegSummary>,
        total_price: Decimal,
    },
    BookingCancelled {
        booking_code: String,
        cancelled_legs: usize,
    },
    SeatAvailability {
        schedule_id: i32,
        travel_date: NaiveDate,
        available_seats: Vec<i32>,
        total_available: usize,
    },
    SeatWarning {
        schedule_id: i32,
        travel_date: NaiveDate,
        remaining: usize,
        priority: WarningPriority,
    },
    ScheduleUpdated {
        schedule_id: i32,
        route_id: i32,
        changes: ScheduleChanges,
    },
    RouteUpdated {
        route_id: i32,
        departure_city: String,
        arrival_city: String,
    },
    Announcement {
        message: String,
        priority: AnnouncementPriority,
    },
}

/// An event addressed to one topic.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub topic: Topic,
    pub event: Event,
}

/// Warning tier for a remaining-seat count, if any.
pub fn warning_priority(remaining: usize) -> Option<WarningPriority> {
    if remaining <= CRITICAL_SEAT_THRESHOLD {
        Some(WarningPriority::Urgent)
    } else if remaining <= LOW_SEAT_THRESHOLD {
        Some(WarningPriority::High)
    } else {
        None
    }
}

/// Real-time fan-out hub. Constructed once at startup and carried in
/// `AppState`; delivery is at-most-once with no backlog, so clients that are
/// disconnected (or lagging) at emission time simply miss the event.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Envelope>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// A fresh receiver over the full event stream. WebSocket sessions
    /// filter by their subscribed topics.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn publish(&self, topic: Topic, event: Event) {
        tracing::debug!(topic = %topic, "publishing event");
        // Send only fails when nobody is connected, which is fine.
        let _ = self.tx.send(Envelope { topic, event });
    }

    pub fn booking_confirmed(
        &self,
        user_id: i32,
        booking_code: String,
        booking_type: BookingType,
        legs: Vec<LegSummary>,
        total_price: Decimal,
    ) {
        self.publish(
            Topic::User(user_id),
            Event::BookingConfirmed {
                booking_code,
                booking_type,
                legs,
                total_price,
            },
        );
    }

    pub fn booking_cancelled(&self, user_id: i32, booking_code: String, cancelled_legs: usize) {
        self.publish(
            Topic::User(user_id),
            Event::BookingCancelled {
                booking_code,
                cancelled_legs,
            },
        );
    }

    /// Push a fresh availability snapshot to schedule watchers, plus a tiered
    /// warning when the seat count is running low.
    pub fn seat_snapshot(&self, schedule_id: i32, travel_date: NaiveDate, available_seats: Vec<i32>) {
        let remaining = available_seats.len();

        self.publish(
            Topic::Schedule(schedule_id),
            Event::SeatAvailability {
                schedule_id,
                travel_date,
                total_available: remaining,
                available_seats,
            },
        );

        if let Some(priority) = warning_priority(remaining) {
            self.publish(
                Topic::Schedule(schedule_id),
                Event::SeatWarning {
                    schedule_id,
                    travel_date,
                    remaining,
                    priority,
                },
            );
        }
    }

    /// Schedule mutations go to schedule watchers and route watchers alike.
    pub fn schedule_updated(&self, schedule_id: i32, route_id: i32, changes: ScheduleChanges) {
        self.publish(
            Topic::Schedule(schedule_id),
            Event::ScheduleUpdated {
                schedule_id,
                route_id,
                changes: changes.clone(),
            },
        );
        self.publish(
            Topic::Route(route_id),
            Event::ScheduleUpdated {
                schedule_id,
                route_id,
                changes,
            },
        );
    }

    pub fn route_updated(&self, route_id: i32, departure_city: String, arrival_city: String) {
        self.publish(
            Topic::Route(route_id),
            Event::RouteUpdated {
                route_id,
                departure_city,
                arrival_city,
            },
        );
    }

    pub fn announce(&self, message: String, priority: AnnouncementPriority) {
        self.publish(Topic::Broadcast, Event::Announcement { message, priority });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_render_as_strings() {
        assert_eq!(Topic::User(7).to_string(), "user:7");
        assert_eq!(Topic::Schedule(3).to_string(), "schedule:3");
        assert_eq!(Topic::Route(12).to_string(), "route:12");
        assert_eq!(Topic::Broadcast.to_string(), "broadcast");
    }

    #[test]
    fn only_schedule_and_route_topics_are_subscribable() {
        assert_eq!(Topic::parse_subscribable("schedule:3"), Some(Topic::Schedule(3)));
        assert_eq!(Topic::parse_subscribable("route:12"), Some(Topic::Route(12)));
        assert_eq!(Topic::parse_subscribable("user:7"), None);
        assert_eq!(Topic::parse_subscribable("broadcast"), None);
        assert_eq!(Topic::parse_subscribable("schedule:abc"), None);
        assert_eq!(Topic::parse_subscribable("nonsense"), None);
    }

    #[test]
    fn warning_tiers_match_thresholds() {
        assert_eq!(warning_priority(11), None);
        assert_eq!(warning_priority(10), Some(WarningPriority::High));
        assert_eq!(warning_priority(6), Some(WarningPriority::High));
        assert_eq!(warning_priority(5), Some(WarningPriority::Urgent));
        assert_eq!(warning_priority(0), Some(WarningPriority::Urgent));
    }

    #[tokio::test]
    async fn published_events_reach_subscribers() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.booking_cancelled(9, "BK000001".to_string(), 2);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.topic, Topic::User(9));
        match envelope.event {
            Event::BookingCancelled {
                booking_code,
                cancelled_legs,
            } => {
                assert_eq!(booking_code, "BK000001");
                assert_eq!(cancelled_legs, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn low_seat_snapshot_emits_snapshot_then_warning() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        notifier.seat_snapshot(1, date, (1..=4).collect());

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, Event::SeatAvailability { total_available: 4, .. }));

        let second = rx.recv().await.unwrap();
        match second.event {
            Event::SeatWarning { remaining, priority, .. } => {
                assert_eq!(remaining, 4);
                assert_eq!(priority, WarningPriority::Urgent);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn comfortable_availability_emits_no_warning() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        notifier.seat_snapshot(1, date, (1..=30).collect());
        notifier.announce("marker".to_string(), AnnouncementPriority::Low);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, Event::SeatAvailability { .. }));

        // Next event is the marker, not a warning.
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.event, Event::Announcement { .. }));
    }

    #[tokio::test]
    async fn schedule_update_fans_out_to_both_topics() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.schedule_updated(4, 2, ScheduleChanges::default());

        assert_eq!(rx.recv().await.unwrap().topic, Topic::Schedule(4));
        assert_eq!(rx.recv().await.unwrap().topic, Topic::Route(2));
    }
}
