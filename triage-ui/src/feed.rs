//! Live waiting-room feed.
//!
//! One sweep task owns the subscriber registry. Every tick it builds a single
//! snapshot of all active triages, serializes it once and offers it to each
//! subscriber's bounded outbox with `try_send`. A full or closed outbox drops
//! that subscriber; the sweep never waits on a slow consumer. New subscribers
//! register by message and receive a frame immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use triage::core::snapshot::ActiveTriageRow;
use triage::ward::Ward;

/// Serialized snapshot shared by all subscribers of one sweep.
pub type Frame = Arc<str>;

/// Handle for registering subscribers with the sweep task.
#[derive(Clone)]
pub struct LiveFeed {
    register_tx: mpsc::Sender<mpsc::Sender<Frame>>,
    buffer: usize,
}

impl LiveFeed {
    /// Spawn the sweep task on the current runtime.
    pub fn spawn(ward: Arc<Ward>, tick: Duration, buffer: usize) -> Self {
        let (register_tx, register_rx) = mpsc::channel(buffer);
        tokio::spawn(run_sweep(ward, tick, register_rx));
        Self {
            register_tx,
            buffer,
        }
    }

    /// Register a subscriber. `None` once the sweep task has stopped.
    pub async fn subscribe(&self) -> Option<mpsc::Receiver<Frame>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.register_tx.send(tx).await.ok()?;
        Some(rx)
    }
}

struct Subscriber {
    id: u64,
    outbox: mpsc::Sender<Frame>,
}

async fn run_sweep(
    ward: Arc<Ward>,
    tick: Duration,
    mut register_rx: mpsc::Receiver<mpsc::Sender<Frame>>,
) {
    let mut subscribers: Vec<Subscriber> = Vec::new();
    let mut next_id = 0_u64;
    let mut clamp = RemainingClamp::default();
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            registered = register_rx.recv() => {
                let Some(outbox) = registered else {
                    debug!("live feed handles dropped, stopping sweep");
                    break;
                };
                next_id += 1;
                let subscriber = Subscriber { id: next_id, outbox };
                let Some(frame) = build_frame(&ward, &mut clamp) else {
                    continue;
                };
                if deliver(&subscriber, &frame) {
                    info!(subscriber = subscriber.id, total = subscribers.len() + 1, "live subscriber registered");
                    subscribers.push(subscriber);
                }
            }
            _ = interval.tick() => {
                if subscribers.is_empty() {
                    continue;
                }
                let Some(frame) = build_frame(&ward, &mut clamp) else {
                    continue;
                };
                subscribers.retain(|subscriber| deliver(subscriber, &frame));
            }
        }
    }
}

fn build_frame(ward: &Ward, clamp: &mut RemainingClamp) -> Option<Frame> {
    let mut rows = ward.snapshot_all();
    clamp.apply(&mut rows);
    match serde_json::to_string(&rows) {
        Ok(json) => Some(Arc::from(json)),
        Err(err) => {
            warn!(error = %err, "failed to serialize live snapshot");
            None
        }
    }
}

/// Offer `frame` without blocking. Returns false if the subscriber must be dropped.
fn deliver(subscriber: &Subscriber, frame: &Frame) -> bool {
    match subscriber.outbox.try_send(Arc::clone(frame)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(subscriber = subscriber.id, "live subscriber lagging, dropped");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(subscriber = subscriber.id, "live subscriber disconnected");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Countdown {
    Step,
    Actions,
    Brigade,
}

/// Keeps emitted remaining values non-increasing per countdown instance.
///
/// A countdown instance is identified by patient, countdown and its end
/// instant; any state change that restarts a countdown moves the end instant
/// and starts a fresh entry. Entries not seen in a sweep are forgotten.
#[derive(Debug, Default)]
pub(crate) struct RemainingClamp {
    emitted: HashMap<(u64, Countdown, i64), i64>,
}

impl RemainingClamp {
    pub(crate) fn apply(&mut self, rows: &mut [ActiveTriageRow]) {
        let mut seen = HashMap::with_capacity(self.emitted.len());
        for row in rows.iter_mut() {
            if let Some(ends_at) = row.timer_ends_at {
                row.time_remaining =
                    self.clamp(&mut seen, (row.id, Countdown::Step, ends_at), row.time_remaining);
            }
            if let (Some(ends_at), Some(remaining)) =
                (row.actions_timer_ends_at, row.actions_time_remaining)
            {
                row.actions_time_remaining =
                    Some(self.clamp(&mut seen, (row.id, Countdown::Actions, ends_at), remaining));
            }
            if let (Some(ends_at), Some(remaining)) =
                (row.brigade_timer_ends_at, row.brigade_time_remaining)
            {
                row.brigade_time_remaining =
                    Some(self.clamp(&mut seen, (row.id, Countdown::Brigade, ends_at), remaining));
            }
        }
        self.emitted = seen;
    }

    fn clamp(
        &self,
        seen: &mut HashMap<(u64, Countdown, i64), i64>,
        key: (u64, Countdown, i64),
        remaining: i64,
    ) -> i64 {
        let value = self
            .emitted
            .get(&key)
            .map_or(remaining, |&previous| previous.min(remaining));
        seen.insert(key, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use triage::core::answers::StepAnswers;
    use triage::test_support::{new_patient, red_consciousness};

    use super::*;
    use crate::state::test_state;

    fn parse(frame: &Frame) -> Vec<Value> {
        serde_json::from_str::<Vec<Value>>(frame).expect("frame json")
    }

    #[tokio::test]
    async fn new_subscriber_gets_immediate_frame() {
        let (_temp, _clock, state) = test_state();
        state.ward.register(new_patient("Anna")).expect("register");

        let mut rx = state.feed.subscribe().await.expect("subscribe");
        let frame = rx.recv().await.expect("first frame");
        let rows = parse(&frame);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["full_name"], "Anna");
        assert_eq!(rows[0]["time_remaining"], 120);
    }

    #[tokio::test]
    async fn ticks_reflect_ward_changes() {
        let (_temp, clock, state) = test_state();
        let id = state.ward.register(new_patient("Anna")).expect("register").patient.id;
        let mut rx = state.feed.subscribe().await.expect("subscribe");
        rx.recv().await.expect("first frame");

        clock.advance_secs(30);
        state
            .ward
            .advance_triage(id, StepAnswers::One(red_consciousness()))
            .expect("advance");

        let mut latest = Vec::new();
        for _ in 0..20 {
            let frame = rx.recv().await.expect("frame");
            latest = parse(&frame);
            if latest[0]["priority"] == "red" {
                break;
            }
        }
        assert_eq!(latest[0]["priority"], "red");
        assert_eq!(latest[0]["is_in_actions"], true);
        assert_eq!(latest[0]["actions_time_remaining"], 300);
    }

    #[tokio::test]
    async fn lagging_subscriber_is_dropped_without_blocking_others() {
        let (_temp, _clock, state) = test_state();
        state.ward.register(new_patient("Anna")).expect("register");

        let mut slow = state.feed.subscribe().await.expect("subscribe");
        let mut fast = state.feed.subscribe().await.expect("subscribe");

        // The fast reader keeps up long enough for the slow outbox to overflow.
        for _ in 0..(crate::state::TEST_BUFFER * 3) {
            fast.recv().await.expect("fast frame");
        }

        let mut drained = 0;
        while slow.recv().await.is_some() {
            drained += 1;
        }
        assert!(drained <= crate::state::TEST_BUFFER);
        assert!(fast.recv().await.is_some());
    }

    fn row(id: u64, remaining: i64, ends_at: i64) -> ActiveTriageRow {
        ActiveTriageRow {
            id,
            full_name: String::new(),
            performer_name: String::new(),
            step: 1,
            step_name: "Level of consciousness",
            priority: triage::core::types::Priority::Pending,
            priority_name: "not determined",
            time_remaining: remaining,
            timer_ends_at: Some(ends_at),
            eye_opening_score: 0,
            verbal_score: 0,
            motor_score: 0,
            consciousness_score: 0,
            is_in_actions: false,
            actions_time_remaining: None,
            actions_timer_ends_at: None,
            brigade_time_remaining: None,
            brigade_timer_ends_at: None,
            actions_total: 0,
            actions_completed: 0,
        }
    }

    #[test]
    fn clamp_never_lets_remaining_grow_for_same_countdown() {
        let mut clamp = RemainingClamp::default();
        let mut rows = vec![row(1, 50, 1_000)];
        clamp.apply(&mut rows);
        assert_eq!(rows[0].time_remaining, 50);

        // Clock stepped backwards.
        let mut rows = vec![row(1, 65, 1_000)];
        clamp.apply(&mut rows);
        assert_eq!(rows[0].time_remaining, 50);

        let mut rows = vec![row(1, 40, 1_000)];
        clamp.apply(&mut rows);
        assert_eq!(rows[0].time_remaining, 40);
    }

    #[test]
    fn clamp_resets_when_countdown_restarts() {
        let mut clamp = RemainingClamp::default();
        let mut rows = vec![row(1, 10, 1_000)];
        clamp.apply(&mut rows);

        let mut rows = vec![row(1, 300, 1_400)];
        clamp.apply(&mut rows);
        assert_eq!(rows[0].time_remaining, 300);
        assert_eq!(clamp.emitted.len(), 1);

        clamp.apply(&mut []);
        assert!(clamp.emitted.is_empty());
    }
}
