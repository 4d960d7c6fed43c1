//! Host-clock timers for the audio engine
//!
//! A cooperative stand-in for `setInterval`/`setTimeout`: the host pumps the
//! queue from its frame callback with its millisecond clock, and due timers
//! come back as actions to run on the same thread.
//!
//! Timers set between polls start counting at the next poll. The host may
//! stall for a long time between frames, so the last polled time is not a
//! usable stand-in for the moment the timer was set.

/// Opaque timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Schedule the next chord of the backing track
    ScheduleChord,
    /// Put the music bus back to its nominal level after a fade-out
    RestoreMusicGain,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    delay_ms: f64,
    /// None until the first poll after the timer was set
    due_ms: Option<f64>,
    period_ms: Option<f64>,
    action: TimerAction,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
    now_ms: f64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last time seen by `poll`
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Fire once, `delay_ms` after the next poll
    pub fn set_timeout(&mut self, delay_ms: f64, action: TimerAction) -> TimerId {
        self.push(delay_ms, None, action)
    }

    /// Fire every `period_ms`, first one a full period after the next poll
    pub fn set_interval(&mut self, period_ms: f64, action: TimerAction) -> TimerId {
        self.push(period_ms, Some(period_ms), action)
    }

    /// Remove a timer; unknown ids are ignored
    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of live repeating timers
    pub fn repeating(&self) -> usize {
        self.timers.iter().filter(|t| t.period_ms.is_some()).count()
    }

    /// Advance the clock to `now_ms` and return due actions in due order
    ///
    /// A repeating timer fires at most once per poll; after a stall it is
    /// re-anchored instead of bursting to catch up.
    pub fn poll(&mut self, now_ms: f64) -> Vec<TimerAction> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut due: Vec<(f64, u64, TimerAction)> = Vec::new();
        for timer in &mut self.timers {
            let due_ms = *timer.due_ms.get_or_insert(now + timer.delay_ms);
            if due_ms > now {
                continue;
            }
            due.push((due_ms, timer.id.0, timer.action));
            if let Some(period) = timer.period_ms {
                let mut next = due_ms + period;
                if next <= now {
                    next = now + period;
                }
                timer.due_ms = Some(next);
            }
        }
        self.timers
            .retain(|t| t.period_ms.is_some() || t.due_ms.is_some_and(|d| d > now));

        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, _, action)| action).collect()
    }

    fn push(&mut self, delay_ms: f64, period_ms: Option<f64>, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            delay_ms,
            due_ms: None,
            period_ms,
            action,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_fires_once() {
        let mut timers = TimerQueue::new();
        timers.set_timeout(500.0, TimerAction::RestoreMusicGain);

        assert!(timers.poll(0.0).is_empty());
        assert!(timers.poll(499.0).is_empty());
        assert_eq!(timers.poll(500.0), vec![TimerAction::RestoreMusicGain]);
        assert!(timers.poll(2000.0).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_interval_repeats_until_cancelled() {
        let mut timers = TimerQueue::new();
        let id = timers.set_interval(2000.0, TimerAction::ScheduleChord);

        assert!(timers.poll(0.0).is_empty());
        assert!(timers.poll(1999.0).is_empty());
        assert_eq!(timers.poll(2000.0).len(), 1);
        assert_eq!(timers.poll(4001.0).len(), 1);
        assert_eq!(timers.repeating(), 1);

        timers.cancel(id);
        assert!(!timers.is_active(id));
        assert!(timers.poll(10_000.0).is_empty());
    }

    #[test]
    fn test_interval_does_not_burst_after_stall() {
        let mut timers = TimerQueue::new();
        timers.set_interval(100.0, TimerAction::ScheduleChord);
        timers.poll(0.0);

        // Ten periods late: still a single firing, next one a period later
        assert_eq!(timers.poll(1000.0).len(), 1);
        assert!(timers.poll(1050.0).is_empty());
        assert_eq!(timers.poll(1100.0).len(), 1);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut timers = TimerQueue::new();
        timers.poll(1000.0);
        timers.poll(10.0);
        assert_eq!(timers.now_ms(), 1000.0);

        timers.set_timeout(5.0, TimerAction::RestoreMusicGain);
        assert!(timers.poll(1000.0).is_empty());
        assert_eq!(timers.poll(1005.0).len(), 1);
    }

    #[test]
    fn test_timer_set_after_host_gap_counts_from_next_poll() {
        let mut timers = TimerQueue::new();
        timers.poll(0.0);
        timers.set_interval(2000.0, TimerAction::ScheduleChord);

        // The host only comes back ten seconds later
        assert!(timers.poll(10_000.0).is_empty());
        assert!(timers.poll(11_999.0).is_empty());
        assert_eq!(timers.poll(12_000.0), vec![TimerAction::ScheduleChord]);
    }

    #[test]
    fn test_zero_delay_fires_on_next_poll() {
        let mut timers = TimerQueue::new();
        timers.set_timeout(0.0, TimerAction::RestoreMusicGain);
        assert_eq!(timers.poll(42.0), vec![TimerAction::RestoreMusicGain]);
        assert!(timers.is_empty());
    }
}
