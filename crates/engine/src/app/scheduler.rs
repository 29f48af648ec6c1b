/// Handle for a scheduled timer, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    handle: TimerHandle,
    remaining_seconds: f32,
    sequence: u64,
    payload: T,
}

/// Cooperative one-shot timer queue, advanced by the fixed-dt tick.
/// Replaces the original's environment-scheduled delayed callbacks with
/// typed payloads returned to the owner; there is no callback storage, so
/// a torn-down owner simply calls [`Scheduler::cancel_all`] and nothing
/// can fire against dead state.
#[derive(Debug)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_handle: u64,
    next_sequence: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_handle: 0,
            next_sequence: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to fire after `delay_seconds`. A non-positive
    /// delay fires on the next tick.
    pub fn schedule(&mut self, delay_seconds: f32, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.timers.push(Timer {
            handle,
            remaining_seconds: delay_seconds.max(0.0),
            sequence,
            payload,
        });
        handle
    }

    /// Returns `true` when the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|timer| timer.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Advances all timers by `dt_seconds` and returns the payloads whose
    /// deadline elapsed, ordered by deadline, then by schedule order for
    /// ties.
    pub fn tick(&mut self, dt_seconds: f32) -> Vec<T> {
        if dt_seconds <= 0.0 || self.timers.is_empty() {
            return Vec::new();
        }

        for timer in &mut self.timers {
            timer.remaining_seconds -= dt_seconds;
        }

        let mut fired: Vec<Timer<T>> = Vec::new();
        let mut remaining: Vec<Timer<T>> = Vec::new();
        for timer in self.timers.drain(..) {
            if timer.remaining_seconds <= 0.0 {
                fired.push(timer);
            } else {
                remaining.push(timer);
            }
        }
        self.timers = remaining;

        fired.sort_by(|a, b| {
            a.remaining_seconds
                .partial_cmp(&b.remaining_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.sequence.cmp(&b.sequence))
        });
        fired.into_iter().map(|timer| timer.payload).collect()
    }
}
