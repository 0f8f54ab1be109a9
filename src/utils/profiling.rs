use std::time::{Duration, Instant};

/// Wall-clock breakdown of the most recent tick, one field per stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickProfile {
    pub force_time: Duration,
    pub obstacle_time: Duration,
    pub drag_time: Duration,
    pub integrator_time: Duration,
    pub topology_time: Duration,
    pub total_tick_time: Duration,

    pub blob_count: usize,
    pub point_count: usize,
    pub obstacle_count: usize,
    pub frozen: bool,
}

impl TickProfile {
    pub fn report(&self) {
        let total_us = self.total_tick_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        let share = |stage: Duration| (stage.as_micros() as f32 / total_us) * 100.0;
        log::debug!(
            "tick: {:.3} ms | blobs {} points {} obstacles {} | forces {:.1}% obstacles {:.1}% drag {:.1}% integrate {:.1}% topology {:.1}%",
            self.total_tick_time.as_secs_f32() * 1000.0,
            self.blob_count,
            self.point_count,
            self.obstacle_count,
            share(self.force_time),
            share(self.obstacle_time),
            share(self.drag_time),
            share(self.integrator_time),
            share(self.topology_time),
        );
    }
}

/// Adds the scope's elapsed time to a profile field on drop.
pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
