//! Connectivity checks run before a save attempt.
//!
//! Two independent checks gate every save: plain internet reachability
//! against a handful of well-known endpoints, and reachability of at least
//! one ledger RPC node. Both produce a [`ProbeReport`] whose `details` text is
//! shown to the user verbatim when the check fails.

pub mod config;
pub mod error;
pub mod ping;
pub mod probe;
pub mod report;

pub use config::{Endpoint, LedgerProbeMode, ProbeConfig};
pub use error::{ProbeError, ProbeResult};
pub use ping::{HttpPing, ReqwestPing};
pub use probe::{LedgerEndpoint, NetworkProbe};
pub use report::{NetworkReport, ProbeReport, Verdict};
