//! Scan input state machine
//!
//! Owns the characters typed by the scan device between submissions. The
//! controller is synchronous: it answers what the driver should do next and
//! leaves timing and I/O to [`crate::driver::KioskDriver`].
//!
//! ```text
//! Idle --change--> Accumulating --debounce / length / submit--> Submitting --reply--> Idle
//! ```

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Accumulating,
    /// At least one submission is waiting for its reply
    Submitting,
}

/// What the driver must do after an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to submit; cancel any pending debounce
    Wait,
    /// (Re)start the debounce timer
    ArmDebounce,
    /// Fire immediately
    FireNow,
}

/// Result of [`ScanController::fire`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Send this code to the check-in endpoint
    Send(String),
    /// Same code as the previous submission
    Suppressed(String),
    /// Dropped because the kiosk is offline
    Offline(String),
    Empty,
}

#[derive(Debug)]
pub struct ScanController {
    buffer: String,
    last_submitted: Option<String>,
    expected_len: Option<usize>,
    online: bool,
    phase: ScanPhase,
    in_flight: usize,
}

impl ScanController {
    /// `expected_len` fires a submission as soon as that many characters
    /// have been scanned
    pub fn new(expected_len: Option<usize>) -> Self {
        Self {
            buffer: String::new(),
            last_submitted: None,
            expected_len: expected_len.filter(|len| *len > 0),
            online: false,
            phase: ScanPhase::Idle,
            in_flight: 0,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[cfg(test)]
    pub fn last_submitted(&self) -> Option<&str> {
        self.last_submitted.as_deref()
    }

    #[cfg(test)]
    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// The input field now holds `text`
    pub fn on_change(&mut self, text: &str) -> Step {
        self.buffer.clear();
        self.buffer.push_str(text);

        let len = self.buffer.trim().chars().count();
        if len == 0 {
            self.phase = self.resting_phase();
            return Step::Wait;
        }

        self.phase = ScanPhase::Accumulating;
        match self.expected_len {
            Some(expected) if len >= expected => Step::FireNow,
            _ => Step::ArmDebounce,
        }
    }

    /// Explicit Enter / submit action
    pub fn on_submit(&self) -> Step {
        if self.buffer.trim().is_empty() {
            Step::Wait
        } else {
            Step::FireNow
        }
    }

    /// Take the accumulated code. The buffer is cleared whatever the result.
    pub fn fire(&mut self) -> Submission {
        let code = self.buffer.trim().to_string();
        self.buffer.clear();
        self.phase = self.resting_phase();

        if code.is_empty() {
            return Submission::Empty;
        }
        if !self.online {
            return Submission::Offline(code);
        }
        if self.last_submitted.as_deref() == Some(code.as_str()) {
            debug!("Suppressing repeated scan of {}", code);
            return Submission::Suppressed(code);
        }

        self.last_submitted = Some(code.clone());
        self.in_flight += 1;
        self.phase = ScanPhase::Submitting;
        Submission::Send(code)
    }

    /// Clear the buffer without submitting; returns what was discarded
    pub fn discard(&mut self) -> String {
        let code = self.buffer.trim().to_string();
        self.buffer.clear();
        self.phase = self.resting_phase();
        code
    }

    /// A submission of `code` finished. `delivered` is false when no
    /// check-in status came back, in which case the same code may be
    /// scanned again.
    pub fn on_reply(&mut self, code: &str, delivered: bool) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !delivered && self.last_submitted.as_deref() == Some(code) {
            self.last_submitted = None;
        }
        if self.phase == ScanPhase::Submitting {
            self.phase = self.resting_phase();
        }
    }

    /// Returns whether the flag changed
    pub fn set_online(&mut self, online: bool) -> bool {
        let changed = self.online != online;
        self.online = online;
        changed
    }

    fn resting_phase(&self) -> ScanPhase {
        if !self.buffer.trim().is_empty() {
            ScanPhase::Accumulating
        } else if self.in_flight > 0 {
            ScanPhase::Submitting
        } else {
            ScanPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online(expected_len: Option<usize>) -> ScanController {
        let mut controller = ScanController::new(expected_len);
        controller.set_online(true);
        controller
    }

    #[test]
    fn test_keystrokes_arm_debounce_until_length_reached() {
        let mut controller = online(Some(3));

        assert_eq!(controller.on_change("1"), Step::ArmDebounce);
        assert_eq!(controller.phase(), ScanPhase::Accumulating);
        assert_eq!(controller.on_change("11"), Step::ArmDebounce);
        assert_eq!(controller.on_change("111"), Step::FireNow);
        assert_eq!(controller.on_change("1111"), Step::FireNow);
    }

    #[test]
    fn test_without_expected_length_only_debounce_fires() {
        let mut controller = online(None);

        assert_eq!(controller.on_change("123456789"), Step::ArmDebounce);
        assert_eq!(controller.on_submit(), Step::FireNow);
    }

    #[test]
    fn test_zero_expected_length_is_ignored() {
        let mut controller = online(Some(0));
        assert_eq!(controller.on_change("1"), Step::ArmDebounce);
    }

    #[test]
    fn test_fire_clears_buffer_before_reply() {
        let mut controller = online(None);
        controller.on_change(" 111 ");

        assert_eq!(controller.fire(), Submission::Send("111".to_string()));
        assert_eq!(controller.buffer(), "");
        assert_eq!(controller.phase(), ScanPhase::Submitting);

        controller.on_reply("111", true);
        assert_eq!(controller.phase(), ScanPhase::Idle);
    }

    #[test]
    fn test_repeated_code_is_suppressed() {
        let mut controller = online(None);
        controller.on_change("111");
        controller.fire();
        controller.on_reply("111", true);

        controller.on_change("111");
        assert_eq!(controller.fire(), Submission::Suppressed("111".to_string()));

        controller.on_change("222");
        assert_eq!(controller.fire(), Submission::Send("222".to_string()));
        controller.on_change("111");
        assert_eq!(controller.fire(), Submission::Send("111".to_string()));
    }

    #[test]
    fn test_failed_delivery_allows_rescan() {
        let mut controller = online(None);
        controller.on_change("111");
        controller.fire();
        controller.on_reply("111", false);

        assert_eq!(controller.last_submitted(), None);
        controller.on_change("111");
        assert_eq!(controller.fire(), Submission::Send("111".to_string()));
    }

    #[test]
    fn test_stale_failure_keeps_newer_suppression() {
        let mut controller = online(None);
        controller.on_change("111");
        controller.fire();
        controller.on_change("222");
        controller.fire();

        controller.on_reply("111", false);
        assert_eq!(controller.last_submitted(), Some("222"));
    }

    #[test]
    fn test_offline_drops_submission() {
        let mut controller = ScanController::new(None);
        controller.on_change("111");

        assert_eq!(controller.fire(), Submission::Offline("111".to_string()));
        assert_eq!(controller.buffer(), "");
        assert_eq!(controller.last_submitted(), None);
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn test_blank_input_waits() {
        let mut controller = online(Some(3));

        assert_eq!(controller.on_change("   "), Step::Wait);
        assert_eq!(controller.on_submit(), Step::Wait);
        assert_eq!(controller.fire(), Submission::Empty);
        assert_eq!(controller.phase(), ScanPhase::Idle);
    }

    #[test]
    fn test_typing_during_submission_accumulates() {
        let mut controller = online(None);
        controller.on_change("111");
        controller.fire();

        controller.on_change("2");
        assert_eq!(controller.phase(), ScanPhase::Accumulating);
        controller.on_reply("111", true);
        assert_eq!(controller.phase(), ScanPhase::Accumulating);
        assert_eq!(controller.buffer(), "2");
    }

    #[test]
    fn test_set_online_reports_changes() {
        let mut controller = ScanController::new(None);

        assert!(controller.set_online(true));
        assert!(!controller.set_online(true));
        assert!(controller.set_online(false));
        assert!(!controller.is_online());
    }
}
