//! Frame timing and performance measurement.

use std::{
    cell::Cell,
    fmt::{self, Arguments},
    mem,
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

const EMA_ALPHA: f32 = 0.3;

/// A timer that can measure and average the time an operation takes.
///
/// Collected timings are averaged and reset when the timer is displayed using `{}`
/// ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    state: Mutex<State>,
}

struct State {
    /// The current exponential moving average, in seconds. `None` until the first measurement.
    avg: Option<f32>,
    /// The number of time measurements that contributed to the current `avg`.
    count: usize,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(State {
                avg: None,
                count: 0,
            }),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, timee: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        timee()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is measured and recorded.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn stop(&self, start: Instant) {
        self.record(start.elapsed());
    }

    fn record(&self, duration: Duration) {
        let secs = duration.as_secs_f32();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.avg = Some(match state.avg {
            Some(avg) => avg + EMA_ALPHA * (secs - avg),
            None => secs,
        });
        state.count += 1;
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let avg = mem::take(&mut state.avg).unwrap_or(0.0);
        let len = mem::replace(&mut state.count, 0);
        let avg_ms = avg * 1000.0;

        write!(f, "{}: {len}x{avg_ms:.01}ms", self.name)
    }
}

/// Cloning a timer resets its collected timings.
impl Clone for Timer {
    fn clone(&self) -> Self {
        Self::new(self.name)
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.stop(self.start);
    }
}

/// Logs frames per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS and `extra` data if one second has passed.
    pub fn tick_with<D: fmt::Display, I: IntoIterator<Item = D>>(&mut self, extra: I) {
        struct DisplayExtra<D: fmt::Display, I: Iterator<Item = D>>(Cell<Option<I>>);

        impl<D: fmt::Display, I: Iterator<Item = D>> fmt::Display for DisplayExtra<D, I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let Some(mut iter) = self.0.take() else {
                    return Ok(());
                };
                match iter.next() {
                    Some(item) => {
                        f.write_str(" (")?;
                        write!(f, "{}", item)?;
                        for item in iter {
                            f.write_str(", ")?;
                            write!(f, "{}", item)?;
                        }
                        f.write_str(")")?;
                        Ok(())
                    }
                    None => Ok(()),
                }
            }
        }

        self.tick_impl(format_args!(
            "{}",
            DisplayExtra(Cell::new(Some(extra.into_iter())))
        ));
    }

    fn tick_impl(&mut self, args: Arguments<'_>) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            log::debug!("{}: {} FPS{}", self.name, self.frames, args);

            self.frames = 0;
            self.start = Instant::now();
        }
    }
}

/// Paces a loop to a fixed refresh rate, standing in for the display's vertical refresh.
///
/// [`FramePacer::wait`] blocks until the next refresh deadline. When an iteration overruns, the
/// deadlines it missed are skipped instead of being caught up on, so a slow loop simply runs at a
/// lower rate.
pub struct FramePacer {
    interval: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    /// Creates a pacer for `refresh_rate` refreshes per second.
    ///
    /// A refresh rate of 0 disables pacing.
    pub fn new(refresh_rate: u32) -> Self {
        let interval = match refresh_rate {
            0 => Duration::ZERO,
            hz => Duration::from_secs(1) / hz,
        };
        Self {
            interval,
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next refresh deadline.
    pub fn wait(&mut self) {
        let now = Instant::now();
        let deadline = self.next.unwrap_or(now);
        if deadline > now {
            thread::sleep(deadline - now);
        }
        self.next = Some(next_deadline(deadline, Instant::now(), self.interval));
    }
}

/// Computes the first deadline after `now` on the grid `deadline + n * interval`.
fn next_deadline(deadline: Instant, now: Instant, interval: Duration) -> Instant {
    if interval.is_zero() {
        return now;
    }
    let mut next = deadline + interval;
    if next <= now {
        let behind = now - next;
        let missed = (behind.as_nanos() / interval.as_nanos()) as u32 + 1;
        log::trace!("frame pacer skipped {missed} refreshes");
        next += interval * missed;
    }
    next
}
