//! Deferred continuations
//!
//! Everything runs on the simulation thread. A "wait N seconds, then continue"
//! is a payload parked here until enough fixed steps have elapsed. Whoever
//! receives a due payload re-checks that its target still exists.

/// Handle for cancelling a scheduled payload
pub type TimerId = u64;

#[derive(Debug, Clone)]
struct Pending<T> {
    id: TimerId,
    due: f64,
    payload: T,
}

/// Single-threaded delay queue driven by the fixed step
#[derive(Debug, Clone)]
pub struct Timers<T> {
    now: f64,
    next_id: TimerId,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `payload` for `delay` seconds (negative delays count as zero)
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + f64::from(delay.max(0.0)),
            payload,
        });
        id
    }

    /// Drop a pending payload. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Advance the clock and take every payload that came due
    ///
    /// Ordered by due time, then by scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += f64::from(dt);
        // Tolerate float drift from summing fixed steps
        let horizon = self.now + 1e-6;

        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.due <= horizon);
        self.pending = rest;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_fires_after_delay() {
        let mut timers = Timers::new();
        timers.schedule(0.1, "fade");

        // 0.1s at 50 Hz is 5 steps
        for _ in 0..4 {
            assert!(timers.advance(SIM_DT).is_empty());
        }
        assert_eq!(timers.advance(SIM_DT), vec!["fade"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_zero_delay_fires_next_advance() {
        let mut timers = Timers::new();
        timers.schedule(0.0, 1);
        timers.schedule(-3.0, 2);
        assert_eq!(timers.advance(SIM_DT), vec![1, 2]);
    }

    #[test]
    fn test_order_by_due_then_schedule() {
        let mut timers = Timers::new();
        timers.schedule(0.5, "late");
        timers.schedule(0.2, "early");
        timers.schedule(0.2, "early-second");
        assert_eq!(timers.advance(1.0), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel() {
        let mut timers = Timers::new();
        let id = timers.schedule(0.2, "destroy");
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.advance(1.0).is_empty());
    }
}
