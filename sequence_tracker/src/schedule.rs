// THEORY:
// The runner learns the target once, at `--learn-at`, and toggles tracking at each
// `--toggle-at` index. Both only make sense on a frame that actually decoded, so an
// event whose frame was dropped stays pending and fires on the next decodable
// frame instead of being lost.

/// What the runner does to the tracker after a frame has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Nothing,
    Learn,
    Stop,
}

/// The learn and toggle events of one run, in frame order.
#[derive(Debug, Clone)]
pub struct Schedule {
    learn_at: usize,
    learn_pending: bool,
    toggles: Vec<usize>,
    next_toggle: usize,
}

impl Schedule {
    pub fn new(learn_at: usize, mut toggle_at: Vec<usize>) -> Self {
        toggle_at.sort_unstable();
        toggle_at.dedup();
        Self {
            learn_at,
            learn_pending: true,
            toggles: toggle_at,
            next_toggle: 0,
        }
    }

    /// Decides the action after frame `index`.
    ///
    /// Nothing fires on a dropped frame. On a decoded frame, the initial learn fires
    /// once `index >= learn_at` unless tracking is already running. Toggles that came
    /// due meanwhile are applied by parity: an even number cancels out.
    pub fn after_frame(&mut self, index: usize, decoded: bool, tracking: bool) -> Action {
        if !decoded {
            return Action::Nothing;
        }

        let mut due_toggles = 0;
        while self.toggles.get(self.next_toggle).is_some_and(|&t| t <= index) {
            self.next_toggle += 1;
            due_toggles += 1;
        }

        if self.learn_pending && index >= self.learn_at {
            self.learn_pending = false;
            if !tracking {
                return Action::Learn;
            }
        }

        match (due_toggles % 2 == 1, tracking) {
            (false, _) => Action::Nothing,
            (true, true) => Action::Stop,
            (true, false) => Action::Learn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_at_the_requested_frame() {
        let mut schedule = Schedule::new(2, vec![]);
        assert_eq!(schedule.after_frame(0, true, false), Action::Nothing);
        assert_eq!(schedule.after_frame(1, true, false), Action::Nothing);
        assert_eq!(schedule.after_frame(2, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(3, true, true), Action::Nothing);
    }

    #[test]
    fn dropped_learn_frame_defers_to_next_decoded_frame() {
        let mut schedule = Schedule::new(0, vec![]);
        assert_eq!(schedule.after_frame(0, false, false), Action::Nothing);
        assert_eq!(schedule.after_frame(1, false, false), Action::Nothing);
        assert_eq!(schedule.after_frame(2, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(3, true, true), Action::Nothing);
    }

    #[test]
    fn initial_learn_fires_only_once() {
        let mut schedule = Schedule::new(0, vec![]);
        assert_eq!(schedule.after_frame(0, true, false), Action::Learn);
        // A failed learn leaves the tracker untracked; the runner does not retry it.
        assert_eq!(schedule.after_frame(1, true, false), Action::Nothing);
    }

    #[test]
    fn toggles_stop_then_relearn() {
        let mut schedule = Schedule::new(0, vec![5, 3]);
        assert_eq!(schedule.after_frame(0, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(3, true, true), Action::Stop);
        assert_eq!(schedule.after_frame(4, true, false), Action::Nothing);
        assert_eq!(schedule.after_frame(5, true, false), Action::Learn);
    }

    #[test]
    fn toggle_on_dropped_frame_is_kept_pending() {
        let mut schedule = Schedule::new(0, vec![4]);
        assert_eq!(schedule.after_frame(0, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(4, false, true), Action::Nothing);
        assert_eq!(schedule.after_frame(5, true, true), Action::Stop);
    }

    #[test]
    fn pending_toggles_cancel_in_pairs() {
        let mut schedule = Schedule::new(0, vec![4, 5]);
        assert_eq!(schedule.after_frame(0, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(4, false, true), Action::Nothing);
        assert_eq!(schedule.after_frame(5, false, true), Action::Nothing);
        assert_eq!(schedule.after_frame(6, true, true), Action::Nothing);
    }

    #[test]
    fn toggle_before_learn_at_starts_tracking_early() {
        let mut schedule = Schedule::new(5, vec![2]);
        assert_eq!(schedule.after_frame(2, true, false), Action::Learn);
        assert_eq!(schedule.after_frame(5, true, true), Action::Nothing);
    }
}
