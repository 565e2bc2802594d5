#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `clientgen-runtime`: Support Layer for Generated Clients
//!
//! Every generated client library depends on this crate. It provides the
//! pieces a client needs at run time that are the same for every service:
//!
//! ## Core Concepts
//!
//! ### `Transport` Trait
//! Defines how a request is sent (`send`), returning the raw
//! [`HttpResponse`] whatever its status. Backends implement this trait to
//! perform their actual I/O; [`HttpPipeline`] wraps one to add credentials
//! and tracking headers.
//!
//! ### `HttpError`
//! Enumerates the failures a client call can produce. Unexpected statuses
//! are mapped to an exception kind through a per-operation status table
//! ([`map_status_error`]).
//!
//! ### Paging and Polling
//! [`PagedIterable`] and [`PagedFlux`] expose paged listings as lazy,
//! forward-only sequences that can restart from a continuation token.
//! [`Poller`] and [`SyncPoller`] drive long-running operations through the
//! transport that started them, with caller-controlled cancellation.
//!
//! ### Open Enums
//! [`ExpandableEnum`] lets generated enums accept values unknown at
//! generation time.
//!
//! ## Example
//! ```no_run
//! use runtime::{DynTransport, HttpRequest, HttpError};
//!
//! async fn demo(transport: DynTransport) -> Result<(), HttpError> {
//!     let response = transport.send(HttpRequest::new("GET", "https://svc/pets")).await?;
//!     println!("status = {}", response.status);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod expandable;
pub mod paging;
pub mod policy;
pub mod polling;
pub mod response;
pub mod transport;
pub mod wire;

pub use error::{
    check_status, check_status_by, check_status_ranged, map_status_error, map_status_error_ranged, HttpError,
    HttpErrorKind, Result,
};
pub use expandable::{ExpandableEnum, ExpandableString};
pub use paging::{Page, PagedFlux, PagedIterable};
pub use policy::{Credential, HttpPipeline};
pub use polling::{
    block_on, FinalStateVia, LongRunningStatus, PollResponse, Poller, PollingStrategy, SyncPoller,
};
pub use response::Response;
pub use tokio_util::sync::CancellationToken;
pub use transport::{encode_component, join_url, to_param, DynTransport, HttpRequest, HttpResponse, Transport};
