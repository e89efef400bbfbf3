//! Diagnosis session state: which evaluation snapshot is current.
//!
//! Fetching a diagnosis is asynchronous, and the user can start a new one
//! while an earlier fetch is still in flight. Installed in arrival order, a
//! slow stale response would overwrite the newer snapshot it lost to. The
//! session sequences installs instead: [`DiagnosisSession::begin`] hands out
//! a ticket per fetch, and only the most recently issued ticket may install
//! its snapshot, exactly once.
//!
//! The fetch itself stays outside this crate; the session is plain
//! synchronous state.
//!
//! # Example
//!
//! ```rust
//! use trellis::session::DiagnosisSession;
//! use trellis::schema::EvaluationResult;
//!
//! let mut session = DiagnosisSession::new();
//! let stale = session.begin();
//! let fresh = session.begin(); // user re-ran the diagnosis
//!
//! assert!(session.install(fresh, EvaluationResult::default()));
//! assert!(!session.install(stale, EvaluationResult::default())); // dropped
//! assert!(session.current().is_some());
//! ```

use log::{debug, warn};

use crate::schema::EvaluationResult;

/// Handle for one in-flight evaluation fetch.
///
/// Opaque outside this module; obtained from [`DiagnosisSession::begin`] and
/// spent in [`DiagnosisSession::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// Owns the current evaluation snapshot and sequences replacements.
#[derive(Debug, Default)]
pub struct DiagnosisSession {
    current: Option<EvaluationResult>,
    last_issued: u64,
    installed: u64,
}

impl DiagnosisSession {
    /// Fresh session with no snapshot and no fetch in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a new fetch in flight and get its ticket.
    ///
    /// Issuing a ticket immediately stales every earlier one, whether or not
    /// its response ever arrives.
    pub fn begin(&mut self) -> FetchTicket {
        self.last_issued += 1;
        debug!("diagnosis fetch {} started", self.last_issued);
        FetchTicket(self.last_issued)
    }

    /// Install a fetched snapshot.
    ///
    /// Accepted only when `ticket` is the most recently issued one and has
    /// not installed before. Returns whether the snapshot became current;
    /// rejected installs are logged and leave the session untouched.
    pub fn install(&mut self, ticket: FetchTicket, result: EvaluationResult) -> bool {
        if ticket.0 != self.last_issued {
            warn!(
                "dropping stale evaluation snapshot (fetch {}, current is {})",
                ticket.0, self.last_issued
            );
            return false;
        }
        if ticket.0 == self.installed {
            warn!("dropping duplicate evaluation snapshot (fetch {})", ticket.0);
            return false;
        }
        debug!(
            "installed evaluation snapshot from fetch {} ({} prediction(s))",
            ticket.0,
            result.len()
        );
        self.current = Some(result);
        self.installed = ticket.0;
        true
    }

    /// The current snapshot, if one has been installed.
    #[must_use]
    pub fn current(&self) -> Option<&EvaluationResult> {
        self.current.as_ref()
    }

    /// Drop the current snapshot.
    ///
    /// Does not reopen the spent ticket: a duplicate response for it still
    /// cannot reinstall after a clear.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
