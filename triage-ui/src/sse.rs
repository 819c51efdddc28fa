//! Server-Sent Events streams: the live monitor and per-patient step timers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use triage::core::snapshot::timer_snapshot;
use triage::core::types::Priority;
use triage::triage_state::TriageState;
use triage::ward::Ward;

use crate::routes::ApiError;
use crate::state::AppState;

/// GET /events - monitor display; one `snapshot` event per sweep.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.feed.subscribe().await;

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        match subscription {
            Some(mut rx) => {
                while let Some(frame) = rx.recv().await {
                    yield Ok(Event::default().event("snapshot").data(&*frame));
                }
                debug!("live subscription closed");
            }
            None => warn!("live feed is not running"),
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive()).text("ping"))
}

#[derive(Debug, Serialize)]
struct TimerPayload {
    step: u8,
    time_remaining: i64,
    expired: bool,
}

#[derive(Debug, Serialize)]
struct ClassifiedPayload {
    priority: Priority,
    priority_name: &'static str,
}

/// GET /triage_events/{id} - step countdown for one patient until classified.
pub async fn triage_events_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    state.ward.triage(id)?;
    let ward = Arc::clone(&state.ward);
    let tick = state.live_tick();

    let stream = async_stream::stream! {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut countdown = StepCountdown::default();

        loop {
            interval.tick().await;
            let triage = match ward.triage(id) {
                Ok(triage) => triage,
                Err(err) => {
                    yield Ok(json_event("gone", &serde_json::json!({ "error": err.kind() })));
                    break;
                }
            };
            if triage.completed_at.is_some() {
                let payload = ClassifiedPayload {
                    priority: triage.priority,
                    priority_name: triage.priority.display_name(),
                };
                yield Ok(json_event("classified", &payload));
                break;
            }
            yield Ok(json_event("timer", &countdown.next(&ward, &triage)));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive()).text("ping")))
}

/// Non-increasing remaining time while the same step countdown runs.
#[derive(Debug, Default)]
struct StepCountdown {
    last: Option<(u8, DateTime<Utc>, i64)>,
}

impl StepCountdown {
    fn next(&mut self, ward: &Ward, triage: &TriageState) -> TimerPayload {
        let snapshot = timer_snapshot(triage, ward.now());
        let mut remaining = snapshot.time_remaining;
        if let Some((step, started, previous)) = self.last
            && step == triage.step
            && started == triage.step_started_at
        {
            remaining = remaining.min(previous);
        }
        self.last = Some((triage.step, triage.step_started_at, remaining));
        TimerPayload {
            step: triage.step,
            time_remaining: remaining,
            expired: remaining == 0,
        }
    }
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    match serde_json::to_string(payload) {
        Ok(json) => Event::default().event(name).data(json),
        Err(err) => {
            warn!(error = %err, event = name, "failed to serialize SSE payload");
            Event::default().event(name).data("{}")
        }
    }
}
