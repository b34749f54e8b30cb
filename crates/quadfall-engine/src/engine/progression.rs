use std::time::Duration;

use tracing::debug;

/// Lines needed to leave level 1, 2, ...; later levels need 5 more each.
const LEVEL_THRESHOLDS: [u32; 10] = [5, 8, 12, 16, 20, 25, 30, 35, 40, 45];
const THRESHOLD_STEP: u32 = 5;

/// Fall interval in milliseconds at level 1, 2, ...; later levels are 5 ms
/// faster each.
const DROP_SPEEDS_MS: [u64; 14] = [400, 350, 300, 260, 220, 185, 155, 130, 110, 90, 75, 60, 50, 40];
const DROP_SPEED_STEP_MS: u64 = 5;
const MIN_DROP_SPEED_MS: u64 = 30;

/// Maps cumulative cleared lines to a level and a fall interval.
///
/// Lines carry over: clearing 7 lines at level 1 (threshold 5) moves to
/// level 2 with 2 lines already counted toward the next threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProgression {
    level: u32,
    lines: u32,
    lines_needed: u32,
    total_lines: u32,
}

impl Default for LevelProgression {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelProgression {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 1,
            lines: 0,
            lines_needed: LEVEL_THRESHOLDS[0],
            total_lines: 0,
        }
    }

    /// Current level, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Lines counted toward the next level.
    #[must_use]
    pub const fn lines(&self) -> u32 {
        self.lines
    }

    /// Lines the current level needs before the next one.
    #[must_use]
    pub const fn lines_needed(&self) -> u32 {
        self.lines_needed
    }

    /// All lines added since the last reset.
    #[must_use]
    pub const fn total_lines(&self) -> u32 {
        self.total_lines
    }

    /// Adds cleared lines and returns how many levels were gained.
    ///
    /// Zero and negative counts change nothing.
    pub fn add_lines(&mut self, n: i32) -> u32 {
        let Ok(n) = u32::try_from(n) else {
            return 0;
        };
        self.total_lines = self.total_lines.saturating_add(n);
        self.lines = self.lines.saturating_add(n);

        let mut gained = 0;
        while self.lines >= self.lines_needed {
            self.lines -= self.lines_needed;
            self.level += 1;
            self.lines_needed = threshold(self.level);
            gained += 1;
        }
        if gained > 0 {
            debug!(level = self.level, lines_needed = self.lines_needed, "level up");
        }
        gained
    }

    /// Fall interval at the current level.
    #[must_use]
    pub fn drop_speed(&self) -> Duration {
        Duration::from_millis(drop_speed_ms(self.level))
    }

    /// Back to level 1 with no lines counted.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

fn threshold(level: u32) -> u32 {
    let index = level.saturating_sub(1) as usize;
    match LEVEL_THRESHOLDS.get(index) {
        Some(&needed) => needed,
        None => {
            let past_end = u32::try_from(index + 1 - LEVEL_THRESHOLDS.len()).unwrap_or(u32::MAX);
            LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1]
                .saturating_add(THRESHOLD_STEP.saturating_mul(past_end))
        }
    }
}

fn drop_speed_ms(level: u32) -> u64 {
    let index = level.saturating_sub(1) as usize;
    let ms = match DROP_SPEEDS_MS.get(index) {
        Some(&ms) => ms,
        None => {
            let past_end = u64::try_from(index + 1 - DROP_SPEEDS_MS.len()).unwrap_or(u64::MAX);
            DROP_SPEEDS_MS[DROP_SPEEDS_MS.len() - 1]
                .saturating_sub(DROP_SPEED_STEP_MS.saturating_mul(past_end))
        }
    };
    ms.max(MIN_DROP_SPEED_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_level_one() {
        let progression = LevelProgression::new();
        assert_eq!(progression.level(), 1);
        assert_eq!(progression.lines(), 0);
        assert_eq!(progression.lines_needed(), 5);
        assert_eq!(progression.drop_speed(), Duration::from_millis(400));
    }

    #[test]
    fn test_level_up_carries_remaining_lines() {
        let mut progression = LevelProgression::new();
        assert_eq!(progression.add_lines(4), 0);
        assert_eq!(progression.add_lines(3), 1);
        assert_eq!(progression.level(), 2);
        assert_eq!(progression.lines(), 2);
        assert_eq!(progression.lines_needed(), 8);
        assert_eq!(progression.total_lines(), 7);
        assert_eq!(progression.drop_speed(), Duration::from_millis(350));
    }

    #[test]
    fn test_several_levels_at_once() {
        let mut progression = LevelProgression::new();
        // 5 + 8 + 12 = 25
        assert_eq!(progression.add_lines(26), 3);
        assert_eq!(progression.level(), 4);
        assert_eq!(progression.lines(), 1);
        assert_eq!(progression.lines_needed(), 16);
    }

    #[test]
    fn test_non_positive_lines_are_ignored() {
        let mut progression = LevelProgression::new();
        progression.add_lines(3);
        assert_eq!(progression.add_lines(0), 0);
        assert_eq!(progression.add_lines(-4), 0);
        assert_eq!(progression.lines(), 3);
        assert_eq!(progression.total_lines(), 3);
    }

    #[test]
    fn test_thresholds_past_table_grow_by_five() {
        assert_eq!(threshold(10), 45);
        assert_eq!(threshold(11), 50);
        assert_eq!(threshold(12), 55);
    }

    #[test]
    fn test_drop_speed_decreases_to_floor() {
        assert_eq!(drop_speed_ms(14), 40);
        assert_eq!(drop_speed_ms(15), 35);
        assert_eq!(drop_speed_ms(16), 30);
        assert_eq!(drop_speed_ms(17), 30);
        assert_eq!(drop_speed_ms(1000), 30);
        assert_eq!(drop_speed_ms(u32::MAX), 30);
        assert_eq!(threshold(u32::MAX), u32::MAX);

        let speeds: Vec<_> = (1..40).map(drop_speed_ms).collect();
        assert!(speeds.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_reset() {
        let mut progression = LevelProgression::new();
        progression.add_lines(40);
        progression.reset();
        assert_eq!(progression, LevelProgression::new());
    }
}
