//! Timed relative moves applied from `PositionController::tick`.

use std::time::Instant;

use crate::error::ServoError;

/// Number of moves that can be pending at once.
pub const SCHEDULE_SLOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledMove {
    pub due: Instant,
    pub offset: i16,
}

#[derive(Debug, Default, Clone)]
pub struct MoveSchedule {
    slots: [Option<ScheduledMove>; SCHEDULE_SLOTS],
}

impl MoveSchedule {
    pub fn push(&mut self, mv: ScheduledMove) -> Result<(), ServoError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .ok_or(ServoError::ScheduleFull)?;
        *slot = Some(mv);
        Ok(())
    }

    /// Remove and return the earliest move due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<ScheduledMove> {
        let idx = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.filter(|m| m.due <= now).map(|m| (i, m.due)))
            .min_by_key(|&(_, due)| due)
            .map(|(i, _)| i)?;
        self.slots[idx].take()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots = [None; SCHEDULE_SLOTS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn mv(due: Instant, offset: i16) -> ScheduledMove {
        ScheduledMove { due, offset }
    }

    #[test]
    fn pops_in_due_order_and_only_when_due() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(60);
        let mut s = MoveSchedule::default();
        s.push(mv(t0 + Duration::from_millis(50), 2)).unwrap();
        s.push(mv(t0 + Duration::from_millis(10), 1)).unwrap();
        assert_eq!(s.push(mv(t0, 3)), Err(ServoError::ScheduleFull));

        assert_eq!(s.pop_due(t0), None);
        assert_eq!(s.pop_due(later).map(|m| m.offset), Some(1));
        assert_eq!(s.pop_due(later).map(|m| m.offset), Some(2));
        assert!(s.is_empty());
    }

    #[test]
    fn clear_frees_slots() {
        let mut s = MoveSchedule::default();
        let due = Instant::now();
        s.push(mv(due, 0)).unwrap();
        s.push(mv(due, 0)).unwrap();
        s.clear();
        assert_eq!(s.len(), 0);
        assert!(s.push(mv(due, 5)).is_ok());
    }
}
