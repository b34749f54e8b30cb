use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event};

#[derive(Debug)]
pub(super) enum LoopEvent {
    /// One game frame elapsed.
    Tick,
    /// Something changed since the last draw.
    Render,
    Input(Event),
}

/// Produces frame ticks at a fixed rate, interleaved with terminal input.
///
/// A render is requested after every tick or input, but never more than once
/// between two of them.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Duration,
    last_tick: Instant,
    dirty: bool,
}

impl EventLoop {
    pub(super) fn new(fps: u64) -> Self {
        Self {
            tick_interval: Duration::from_secs(1) / u32::try_from(fps.max(1)).unwrap_or(u32::MAX),
            last_tick: Instant::now(),
            // Draw once on startup.
            dirty: true,
        }
    }

    /// Blocks until the next tick is due, a render is needed, or input arrives.
    pub(super) fn next(&mut self) -> io::Result<LoopEvent> {
        loop {
            let now = Instant::now();
            let next_tick_at = self.last_tick + self.tick_interval;
            if now >= next_tick_at {
                // Do not try to catch up on ticks missed while the terminal was busy.
                self.last_tick = if now - next_tick_at > self.tick_interval {
                    now
                } else {
                    next_tick_at
                };
                self.dirty = true;
                return Ok(LoopEvent::Tick);
            }

            if self.dirty {
                self.dirty = false;
                return Ok(LoopEvent::Render);
            }

            if !event::poll(next_tick_at.saturating_duration_since(now))? {
                continue;
            }
            self.dirty = true;
            return Ok(LoopEvent::Input(event::read()?));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event_is_render() {
        let mut events = EventLoop::new(1);
        assert!(matches!(events.next().unwrap(), LoopEvent::Render));
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(EventLoop::new(50).tick_interval, Duration::from_millis(20));
        assert_eq!(EventLoop::new(0).tick_interval, Duration::from_secs(1));
    }
}
