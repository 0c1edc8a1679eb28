//! Delayed deletion of empty rooms.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use spinwheel_protocol::RoomCode;
use tokio::task::JoinHandle;

/// Identifies one scheduled expiration.
///
/// A timer task carries its id into the fire handler, which compares it with
/// the scheduler's current entry. A timer that was cancelled or replaced
/// while it was waiting for the registry lock sees a different id and backs
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpirationId(u64);

impl fmt::Display for ExpirationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exp-{}", self.0)
    }
}

#[derive(Debug)]
struct PendingExpiration {
    id: ExpirationId,
    task: JoinHandle<()>,
}

/// At most one pending one-shot timer per room code.
///
/// The scheduler never touches rooms itself. Whatever `on_fire` future the
/// owner supplies runs when the delay elapses; the registry's handler takes
/// the registry lock and re-checks the room before deleting it.
#[derive(Debug, Default)]
pub struct ExpirationScheduler {
    pending: HashMap<RoomCode, PendingExpiration>,
    next_id: u64,
}

impl ExpirationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer for `code`, replacing any existing one.
    ///
    /// `on_fire` receives the new timer's id and builds the future to run
    /// once `delay` has elapsed. Must be called inside a Tokio runtime.
    pub fn schedule<F, Fut>(&mut self, code: RoomCode, delay: Duration, on_fire: F) -> ExpirationId
    where
        F: FnOnce(ExpirationId) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(&code);

        self.next_id += 1;
        let id = ExpirationId(self.next_id);
        let fire = on_fire(id);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        });

        tracing::debug!(room_code = %code, %id, ?delay, "expiration armed");
        self.pending.insert(code, PendingExpiration { id, task });
        id
    }

    /// Aborts the pending timer for `code`. Idempotent.
    ///
    /// Returns `true` if a timer was pending.
    pub fn cancel(&mut self, code: &RoomCode) -> bool {
        match self.pending.remove(code) {
            Some(pending) => {
                pending.task.abort();
                tracing::debug!(room_code = %code, id = %pending.id, "expiration cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `id` is still the live timer for `code`.
    pub fn is_current(&self, code: &RoomCode, id: ExpirationId) -> bool {
        self.pending.get(code).is_some_and(|pending| pending.id == id)
    }

    /// Retires a timer that has fired.
    ///
    /// Returns `false`, and changes nothing, if `id` has been cancelled or
    /// superseded in the meantime.
    pub fn complete(&mut self, code: &RoomCode, id: ExpirationId) -> bool {
        if !self.is_current(code, id) {
            return false;
        }
        // The task is the caller; dropping the handle just detaches it.
        self.pending.remove(code);
        true
    }

    pub fn is_pending(&self, code: &RoomCode) -> bool {
        self.pending.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Aborts every pending timer. Returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
        count
    }
}

impl Drop for ExpirationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn code(s: &str) -> RoomCode {
        RoomCode::from(s)
    }

    /// Arms a timer that reports its id on `tx` when it fires.
    fn arm(
        scheduler: &mut ExpirationScheduler,
        room: &str,
        delay: Duration,
        tx: &mpsc::UnboundedSender<ExpirationId>,
    ) -> ExpirationId {
        let tx = tx.clone();
        scheduler.schedule(code(room), delay, move |id| async move {
            let _ = tx.send(id);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();
        let start = tokio::time::Instant::now();

        let id = arm(&mut scheduler, "111111", Duration::from_secs(60), &tx);
        assert!(scheduler.is_pending(&code("111111")));

        assert_eq!(rx.recv().await, Some(id));
        assert!(start.elapsed() >= Duration::from_secs(60));
        // Firing does not retire the entry; the owner does that.
        assert!(scheduler.complete(&code("111111"), id));
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();

        arm(&mut scheduler, "222222", Duration::from_secs(60), &tx);
        assert!(scheduler.cancel(&code("222222")));
        drop(tx);

        let result = tokio::time::timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(!matches!(result, Ok(Some(_))));
        assert!(!scheduler.is_pending(&code("222222")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();

        assert!(!scheduler.cancel(&code("333333")));
        arm(&mut scheduler, "333333", Duration::from_secs(1), &tx);
        assert!(scheduler.cancel(&code("333333")));
        assert!(!scheduler.cancel(&code("333333")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();

        let first = arm(&mut scheduler, "444444", Duration::from_secs(10), &tx);
        let second = arm(&mut scheduler, "444444", Duration::from_secs(30), &tx);
        assert_ne!(first, second);
        assert_eq!(scheduler.len(), 1);
        assert!(!scheduler.is_current(&code("444444"), first));
        assert!(scheduler.is_current(&code("444444"), second));

        // Only the second timer fires.
        assert_eq!(rx.recv().await, Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_rejects_stale_id() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();

        let stale = arm(&mut scheduler, "555555", Duration::from_secs(10), &tx);
        let live = arm(&mut scheduler, "555555", Duration::from_secs(10), &tx);

        assert!(!scheduler.complete(&code("555555"), stale));
        assert!(scheduler.is_pending(&code("555555")));
        assert!(scheduler.complete(&code("555555"), live));
        assert!(!scheduler.is_pending(&code("555555")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = ExpirationScheduler::new();

        arm(&mut scheduler, "000001", Duration::from_secs(10), &tx);
        arm(&mut scheduler, "000002", Duration::from_secs(10), &tx);
        assert_eq!(scheduler.cancel_all(), 2);
        assert!(scheduler.is_empty());
    }
}
