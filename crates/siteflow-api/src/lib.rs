//! Client for the Siteflow workflow API.
//!
//! Wraps the external REST API (flows, phases, steps) behind a small typed
//! surface:
//! - [`Session`] holds credentials and the cached bearer token, and builds headers
//! - [`SiteflowClient`] authenticates lazily and performs one HTTP call per operation
//! - Every operation returns data ([`ApiResult`] or [`Listing`]), never panics
//!
//! # Example
//!
//! ```ignore
//! use siteflow_api::{PhaseDraft, Session, SessionConfig, SiteflowClient};
//!
//! let session = Session::new(SessionConfig { /* ... */ });
//! let mut client = SiteflowClient::connect(session);
//! for flow in client.list_flows() {
//!     println!("{:?}", flow.name);
//! }
//! let created = client.add_phase_to_flow(&PhaseDraft::new("flow-1", "Review"))?;
//! ```

mod client;
mod error;
mod model;
mod session;
pub mod test_utils;
mod transport;

pub use client::SiteflowClient;
pub use error::{ApiError, ApiResult, ErrorKind, RequestContext, TransportError};
pub use model::{
    Created, Flow, FlowDraft, FlowType, Listing, ManagementProperties, Phase, PhaseDraft,
    PhaseFieldNames, Step, StepDraft, StepManagementProperties, ThematicBlock,
};
pub use session::{DEFAULT_API_PATH, Headers, Session, SessionConfig};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
