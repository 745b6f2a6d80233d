//! The "transaction updated" signal shared by every view of the user's transactions.
//!
//! Handlers that change transactions publish a [TransactionUpdated] signal on
//! the [TransactionEvents] channel owned by [AppState]. The signal carries no
//! data: listeners re-fetch and recompute from scratch.
//!
//! Browsers hear about updates in two ways:
//! - the response to the mutation carries an `HX-Trigger: transactionUpdated`
//!   header, which refreshes views on the same page,
//! - other open pages hold a long-poll request on
//!   [endpoints::TRANSACTION_EVENTS] which resolves with the same header when
//!   the next signal is published.

use std::time::Duration;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};

use crate::{AppState, endpoints};

/// The name of the client-side event fired after transactions change.
pub const TRANSACTION_UPDATED: &str = "transactionUpdated";

/// The `hx-trigger` value for elements that refresh after transactions change.
pub const REFRESH_ON_TRANSACTION_UPDATED: &str = "transactionUpdated from:body";

/// How many unreceived signals a subscriber may fall behind by.
const CHANNEL_CAPACITY: usize = 16;

/// How long a long-poll request waits for a signal before returning.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(25);

/// Signals that one or more transactions were created, edited or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionUpdated;

/// A broadcast channel for [TransactionUpdated] signals.
///
/// Cloning gives another handle to the same channel.
#[derive(Debug, Clone)]
pub struct TransactionEvents {
    sender: Sender<TransactionUpdated>,
}

impl TransactionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self { sender }
    }

    /// Tell all current subscribers that transactions changed.
    ///
    /// Returns the number of subscribers that will receive the signal.
    /// Having no subscribers is not an error.
    pub fn publish(&self) -> usize {
        match self.sender.send(TransactionUpdated) {
            Ok(subscriber_count) => {
                tracing::debug!("published {TRANSACTION_UPDATED} to {subscriber_count} subscribers");
                subscriber_count
            }
            Err(_) => 0,
        }
    }

    /// Receive every signal published from now on.
    pub fn subscribe(&self) -> Receiver<TransactionUpdated> {
        self.sender.subscribe()
    }
}

impl Default for TransactionEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// The response header pair that fires [TRANSACTION_UPDATED] in the browser.
pub fn transaction_updated_header() -> [(&'static str, &'static str); 1] {
    [("hx-trigger", TRANSACTION_UPDATED)]
}

/// The state needed for the long-poll endpoint.
#[derive(Debug, Clone)]
pub struct TransactionEventsState {
    pub events: TransactionEvents,
    pub poll_timeout: Duration,
}

impl FromRef<AppState> for TransactionEventsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            events: state.events.clone(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// An invisible element that keeps a long-poll request open.
///
/// Each response replaces the element, which starts the next request.
pub fn transaction_events_listener() -> Markup {
    html! {
        div
            id="transaction-events"
            class="hidden"
            hx-get=(endpoints::TRANSACTION_EVENTS)
            hx-trigger="load delay:100ms"
            hx-swap="outerHTML"
        {}
    }
}

/// Wait for the next [TransactionUpdated] signal or until the poll times out.
pub async fn wait_for_transaction_update(State(state): State<TransactionEventsState>) -> Response {
    let mut receiver = state.events.subscribe();

    let updated = match tokio::time::timeout(state.poll_timeout, receiver.recv()).await {
        Ok(Ok(TransactionUpdated)) => true,
        Ok(Err(RecvError::Lagged(skipped))) => {
            tracing::debug!("transaction event listener skipped {skipped} signals");
            true
        }
        Ok(Err(RecvError::Closed)) => {
            tracing::warn!("transaction event channel closed");
            false
        }
        Err(_) => false,
    };

    if updated {
        (transaction_updated_header(), transaction_events_listener()).into_response()
    } else {
        transaction_events_listener().into_response()
    }
}

#[cfg(test)]
mod transaction_events_tests {
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode};

    use super::{
        TransactionEvents, TransactionEventsState, TransactionUpdated, wait_for_transaction_update,
    };

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let events = TransactionEvents::new();

        assert_eq!(events.publish(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_signal() {
        let events = TransactionEvents::new();
        let mut first = events.subscribe();
        let mut second = events.clone().subscribe();

        assert_eq!(events.publish(), 2);

        assert_eq!(first.recv().await, Ok(TransactionUpdated));
        assert_eq!(second.recv().await, Ok(TransactionUpdated));
    }

    #[tokio::test]
    async fn long_poll_fires_client_event_after_publish() {
        let events = TransactionEvents::new();
        let state = TransactionEventsState {
            events: events.clone(),
            poll_timeout: Duration::from_secs(5),
        };

        let publisher = tokio::spawn(async move {
            while events.publish() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let response = wait_for_transaction_update(State(state)).await;
        publisher.await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("hx-trigger").unwrap(),
            "transactionUpdated"
        );
    }

    #[tokio::test]
    async fn long_poll_times_out_without_client_event() {
        let state = TransactionEventsState {
            events: TransactionEvents::new(),
            poll_timeout: Duration::from_millis(10),
        };

        let response = wait_for_transaction_update(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("hx-trigger").is_none());
    }
}
