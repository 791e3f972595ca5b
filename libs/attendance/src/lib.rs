//! Check-in recording and attendance aggregation
//!
//! The core of the attendance system:
//!
//! - [`resolver`] computes the eligible-member set of a session from its
//!   attached groups, deduplicating members reachable through several groups.
//! - [`recorder`] records at most one attendance record per member and
//!   session, treating a repeated scan as a normal, idempotent outcome.
//! - [`aggregator`] builds the present/absent view of a session and the
//!   per-member totals over a date range.
//!
//! Persistence is reached through the traits in [`store`]; [`memory`] holds
//! an in-process implementation. [`wire`] holds the JSON payloads exchanged
//! between the HTTP service and the kiosk.

pub mod aggregator;
pub mod error;
pub mod memory;
pub mod models;
pub mod recorder;
pub mod resolver;
pub mod store;
pub mod validation;
pub mod wire;

pub use aggregator::{
    AttendanceAggregator, MemberAttendance, PresentMember, ReportQuery, SessionAttendance,
};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use recorder::{CheckInError, CheckInOutcome, CheckInRecorder, CheckInStatus};
pub use resolver::{MembershipResolver, eligible_members};
pub use store::{AttendanceStore, EndSessionOutcome, InsertOutcome, RosterStore};
pub use wire::{CheckInRequest, CheckInResponse, EndSessionResponse};
