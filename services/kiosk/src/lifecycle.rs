//! Two-phase end-of-session handling
//!
//! Ending a session shows a provisional "ending" view right away. Only the
//! server's answer moves the confirmed state; a failed request rolls the
//! view back.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Active,
    /// End requested, no answer yet
    Ending,
    Ended,
}

#[derive(Debug)]
pub struct SessionLifecycle {
    confirmed_active: bool,
    pending_end: bool,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            confirmed_active: true,
            pending_end: false,
        }
    }

    pub fn view(&self) -> SessionView {
        if !self.confirmed_active {
            SessionView::Ended
        } else if self.pending_end {
            SessionView::Ending
        } else {
            SessionView::Active
        }
    }

    /// Depends on confirmed state only; a pending end still accepts scans
    pub fn accepts_check_ins(&self) -> bool {
        self.confirmed_active
    }

    pub fn is_pending(&self) -> bool {
        self.pending_end
    }

    /// Start ending the session. Returns `false` if there is nothing to do.
    pub fn request_end(&mut self) -> bool {
        if !self.confirmed_active || self.pending_end {
            return false;
        }
        self.pending_end = true;
        true
    }

    /// Apply the server's view of the session
    pub fn reconcile(&mut self, server_active: bool) {
        self.pending_end = false;
        if !server_active {
            self.confirmed_active = false;
        }
    }

    /// The end request failed; nothing was confirmed
    pub fn rollback(&mut self) {
        self.pending_end = false;
    }

    /// A check-in answer reported the session as ended elsewhere
    pub fn observe_ended(&mut self) {
        self.confirmed_active = false;
    }
}
