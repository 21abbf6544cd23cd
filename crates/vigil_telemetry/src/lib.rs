//! Store-and-forward telemetry for the Vigil field node.
//!
//! Files staged under `transmit` directories are shipped to a hub over
//! radio LAN (rsync) or to a remote server over a long-haul link (HTTP
//! upload), with the transceiver powered up on demand through a
//! network-attached relay. The same crate carries the instrument query
//! drivers, which deposit fetched data into `receive` directories for the
//! pipeline monitor.

pub mod batch;
pub mod config;
pub mod deliver;
pub mod error;
pub mod query;
pub mod relay;

pub use batch::{transmit_backlog, BatchOptions, BatchSummary};
pub use config::{
    FdsnInstrumentConfig, GnssInstrumentConfig, RelayConfig, TelemetryConfig, TransportMode,
};
pub use deliver::{deliver, LinkControl, Transport};
pub use error::{Result, TelemetryError};
pub use query::QueryOutcome;
pub use relay::SwitchState;
