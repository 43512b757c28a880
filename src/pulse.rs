/* ************************************************************************ **
** This file is part of rald, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of rald is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.           **
** ************************************************************************ */

//! The cyclic precursor/purge/oxidizer/purge pressure schedule.

/// Which gas is flowing.  The numbering (1 = precursor, 2 = oxidizer,
/// 3 = purge) is the external convention used by reaction declarations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    Precursor = 1,
    Oxidizer = 2,
    Purge = 3,
}

impl Phase {
    pub fn from_index(n: u32) -> Option<Phase> {
        match n {
            1 => Some(Phase::Precursor),
            2 => Some(Phase::Oxidizer),
            3 => Some(Phase::Purge),
            _ => None,
        }
    }
}

/// Maps simulated time onto the ALD cycle
/// `precursor (t1) / purge (t2) / oxidizer (t3) / purge (t4)`.
///
/// `advance` is called after every fired event.  When the time walks past
/// the end of the current cycle, the call that notices only moves the cycle
/// origin; the phase keeps its previous value until the next call
/// re-evaluates it against the new origin.  One firing of staleness, by
/// longstanding convention of the reference runs.
#[derive(Debug, Clone)]
pub struct PulseSchedule {
    t1: f64,
    t2: f64,
    t3: f64,
    t4: f64,
    cycle: f64,
    phase: Phase,
}

impl Default for PulseSchedule {
    fn default() -> PulseSchedule {
        PulseSchedule {
            t1: 0.0,
            t2: 0.0,
            t3: 0.0,
            t4: 0.0,
            cycle: 0.0,
            phase: Phase::Precursor,
        }
    }
}

impl PulseSchedule {
    pub fn new() -> PulseSchedule {
        Default::default()
    }

    /// Set the precursor and oxidizer exposure durations.
    pub fn set_pulse_times(&mut self, t1: f64, t3: f64) {
        self.t1 = t1;
        self.t3 = t3;
    }

    /// Set the two purge durations.
    pub fn set_purge_times(&mut self, t2: f64, t4: f64) {
        self.t2 = t2;
        self.t4 = t4;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start time of the current cycle.
    pub fn cycle_start(&self) -> f64 {
        self.cycle
    }

    pub fn period(&self) -> f64 {
        self.t1 + self.t2 + self.t3 + self.t4
    }

    /// Re-evaluate the phase for the given simulated time.
    pub fn advance(&mut self, time: f64) {
        let c = self.cycle;
        if time < c + self.t1 {
            self.phase = Phase::Precursor;
        } else if time < c + self.t1 + self.t2 {
            self.phase = Phase::Purge;
        } else if time < c + self.t1 + self.t2 + self.t3 {
            self.phase = Phase::Oxidizer;
        } else if time < c + self.t1 + self.t2 + self.t3 + self.t4 {
            self.phase = Phase::Purge;
        } else {
            self.cycle += self.period();
        }
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    fn unit_schedule() -> PulseSchedule {
        let mut pulse = PulseSchedule::new();
        pulse.set_pulse_times(1.0, 1.0);
        pulse.set_purge_times(1.0, 1.0);
        pulse
    }

    #[test]
    fn phase_ladder() {
        let mut pulse = unit_schedule();
        assert_eq!(pulse.phase(), Phase::Precursor);

        pulse.advance(0.5);
        assert_eq!(pulse.phase(), Phase::Precursor);
        pulse.advance(1.5);
        assert_eq!(pulse.phase(), Phase::Purge);
        pulse.advance(2.5);
        assert_eq!(pulse.phase(), Phase::Oxidizer);
        pulse.advance(3.5);
        assert_eq!(pulse.phase(), Phase::Purge);
    }

    #[test]
    fn wrap_keeps_phase_for_one_call() {
        let mut pulse = unit_schedule();
        pulse.advance(3.5);
        assert_eq!(pulse.phase(), Phase::Purge);

        // past the end of the cycle: origin moves, phase is stale
        pulse.advance(4.5);
        assert_eq!(pulse.cycle_start(), 4.0);
        assert_eq!(pulse.phase(), Phase::Purge);

        // the next call sees the new origin
        pulse.advance(4.5);
        assert_eq!(pulse.phase(), Phase::Precursor);
    }

    #[test]
    fn periodic_in_the_limit() {
        let mut pulse = unit_schedule();
        // settle several cycles ahead; each wrap costs one extra call
        for _ in 0..20 {
            pulse.advance(10.2);
        }
        assert_eq!(pulse.cycle_start(), 8.0);
        assert_eq!(pulse.phase(), Phase::Oxidizer); // 10.2 - 8.0 is in the t3 window

        let mut other = unit_schedule();
        other.advance(2.2);
        assert_eq!(other.phase(), Phase::Oxidizer);
    }

    #[test]
    fn zero_durations_stay_in_precursor() {
        let mut pulse = PulseSchedule::new();
        pulse.advance(123.0);
        assert_eq!(pulse.phase(), Phase::Precursor);
        assert_eq!(pulse.cycle_start(), 0.0);
    }
}
