//! Resource operations: list and mutate flows, phases and steps.

use crate::error::{ApiError, ApiResult, RequestContext};
use crate::model::{
    Created, Flow, FlowDraft, Listing, Phase, PhaseDraft, PhaseFieldNames, StepDraft,
};
use crate::session::Session;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

/// Statuses a mutation accepts, and whether a success body may be something other than JSON.
struct Accept {
    statuses: &'static [u16],
    tolerate_non_json: bool,
}

const CREATE: Accept = Accept {
    statuses: &[200, 201],
    tolerate_non_json: false,
};

const UPDATE: Accept = Accept {
    statuses: &[200, 201, 204],
    tolerate_non_json: true,
};

#[derive(Deserialize)]
struct DataEnvelope<D> {
    data: Option<Vec<D>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenReply {
    access_token: Option<String>,
}

/// Error body as compact JSON when it parses, raw text otherwise.
fn error_details(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => body.to_string(),
    }
}

/// Client for one API session.
///
/// Not meant for concurrent use: operations take `&mut self` because the first
/// one may cache a bearer token. Wrap in a mutex to share.
pub struct SiteflowClient<T: Transport = UreqTransport> {
    session: Session,
    transport: T,
    phase_fields: PhaseFieldNames,
}

impl SiteflowClient<UreqTransport> {
    /// Client over a real HTTP connection.
    pub fn connect(session: Session) -> Self {
        Self::new(session, UreqTransport::new())
    }
}

impl<T: Transport> SiteflowClient<T> {
    pub fn new(session: Session, transport: T) -> Self {
        Self {
            session,
            transport,
            phase_fields: PhaseFieldNames::default(),
        }
    }

    /// Override the field names used for phase usage flags.
    pub fn with_phase_fields(mut self, fields: PhaseFieldNames) -> Self {
        self.phase_fields = fields;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase_fields(&self) -> &PhaseFieldNames {
        &self.phase_fields
    }

    fn build(&self, method: Method, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.session.headers(),
            body,
        }
    }

    /// Exchange client credentials for a bearer token.
    ///
    /// Returns false on any failure and leaves the cached token as it was.
    pub fn authenticate(&mut self) -> bool {
        let url = self.session.endpoint("/authenticate");
        let (client_id, client_secret) = self.session.credentials();
        let body = json!({
            "clientId": client_id,
            "clientSecret": client_secret,
        })
        .to_string();
        let request = self.build(Method::Post, url, Some(body));

        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "authentication request failed");
                return false;
            }
        };
        if response.status != 200 {
            warn!(status = response.status, "authentication rejected");
            return false;
        }

        let stored = serde_json::from_str::<TokenReply>(&response.body)
            .ok()
            .and_then(|reply| reply.access_token)
            .is_some_and(|token| self.session.store_token(token));
        if stored {
            info!(project = self.session.project_id(), "authenticated");
        } else {
            warn!("authentication reply carried no access token");
        }
        stored
    }

    /// Authenticate once if no token is cached. A cached token is trusted as is.
    pub fn ensure_authenticated(&mut self) -> ApiResult<()> {
        if self.session.is_authenticated() || self.authenticate() {
            Ok(())
        } else {
            Err(ApiError::AuthenticationFailed)
        }
    }

    /// Flows of the session's project.
    pub fn flows(&mut self) -> Listing<Flow> {
        let url = format!(
            "{}?projectId={}",
            self.session.endpoint("/flows"),
            urlencoding::encode(self.session.project_id())
        );
        self.fetch_list(url)
    }

    /// Flows of the session's project; empty if they could not be fetched.
    pub fn list_flows(&mut self) -> Vec<Flow> {
        self.flows().into_items()
    }

    pub fn flow_phases(&mut self, flow_id: &str) -> Listing<Phase> {
        let route = format!("/flows/{}/phases", urlencoding::encode(flow_id));
        let url = self.session.endpoint(&route);
        self.fetch_list(url)
    }

    /// Phases of a flow; empty if they could not be fetched.
    pub fn list_flow_phases(&mut self, flow_id: &str) -> Vec<Phase> {
        self.flow_phases(flow_id).into_items()
    }

    pub fn add_phase_to_flow(&mut self, draft: &PhaseDraft) -> ApiResult<Created> {
        let route = format!("/flows/{}/add-phases", urlencoding::encode(&draft.flow_id));
        let url = self.session.endpoint(&route);
        let payload = json!({ "data": [draft.to_item(&self.phase_fields)] });
        self.submit(Method::Post, url, payload, &CREATE)
    }

    /// Fails with `InvalidArgument` before any request if a block name is unknown.
    pub fn add_step_to_phase(&mut self, draft: &StepDraft) -> ApiResult<Created> {
        let blocks = draft.blocks()?;
        let route = format!("/phases/{}/add-steps", urlencoding::encode(&draft.phase_id));
        let url = self.session.endpoint(&route);
        let payload = json!({ "data": [draft.to_item(&blocks)] });
        self.submit(Method::Post, url, payload, &CREATE)
    }

    /// Fails with `InvalidArgument` before any request if the flow type is unknown.
    pub fn create_flow(&mut self, draft: &FlowDraft) -> ApiResult<Created> {
        let flow_type = draft.resolved_type()?;
        let family_id = match draft.family_id.as_deref() {
            Some(family) => Some(family.to_string()),
            None => {
                let fallback = self.session.family_id().map(str::to_string);
                if let Some(family) = &fallback {
                    debug!(family = %family, "using configured family id");
                }
                fallback
            }
        };
        let url = self.session.endpoint("/flows/bulk-create");
        let payload = json!({ "data": [draft.to_item(flow_type, family_id.as_deref())] });
        self.submit(Method::Post, url, payload, &CREATE)
    }

    /// Replace a step's text block. HTML is passed through as is.
    pub fn update_step_text(&mut self, step_id: &str, text: &str) -> ApiResult<Created> {
        let route = format!("/steps/{}/update-text-block", urlencoding::encode(step_id));
        let url = self.session.endpoint(&route);
        let payload = json!({ "data": text });
        self.submit(Method::Patch, url, payload, &UPDATE)
    }

    fn fetch_list<D: DeserializeOwned>(&mut self, url: String) -> Listing<D> {
        if let Err(e) = self.ensure_authenticated() {
            return Listing::Unavailable(e);
        }
        let context = RequestContext::new(url.as_str(), "");
        debug!(%url, "listing");
        let request = self.build(Method::Get, url, None);

        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %context.url, error = %e, "listing failed");
                return Listing::Unavailable(ApiError::Transport {
                    message: e.to_string(),
                    request: Some(context),
                });
            }
        };
        if !(200..300).contains(&response.status) {
            warn!(url = %context.url, status = response.status, "listing rejected");
            return Listing::Unavailable(ApiError::Status {
                status: response.status,
                details: error_details(&response.body),
                request: context,
            });
        }

        match serde_json::from_str::<DataEnvelope<D>>(&response.body) {
            Ok(envelope) => Listing::Found(envelope.data.unwrap_or_default()),
            Err(e) => {
                warn!(url = %context.url, error = %e, "listing reply not understood");
                Listing::Unavailable(ApiError::Transport {
                    message: format!("invalid JSON in response: {}", e),
                    request: Some(context),
                })
            }
        }
    }

    fn submit(
        &mut self,
        method: Method,
        url: String,
        payload: Value,
        accept: &Accept,
    ) -> ApiResult<Created> {
        self.ensure_authenticated()?;
        let body = payload.to_string();
        let context = RequestContext::new(url.as_str(), body.as_str());
        debug!(method = method.as_str(), %url, payload = %body, "sending request");
        let request = self.build(method, url, Some(body));

        let response = self.transport.send(&request).map_err(|e| {
            warn!(url = %context.url, error = %e, "request failed");
            ApiError::Transport {
                message: e.to_string(),
                request: Some(context.clone()),
            }
        })?;
        debug!(status = response.status, body = %response.body, "received response");

        if !accept.statuses.contains(&response.status) {
            warn!(url = %context.url, status = response.status, "request rejected");
            return Err(ApiError::Status {
                status: response.status,
                details: error_details(&response.body),
                request: context,
            });
        }
        decode_success(response, accept, context)
    }
}

fn decode_success(
    response: HttpResponse,
    accept: &Accept,
    context: RequestContext,
) -> ApiResult<Created> {
    if response.body.trim().is_empty() {
        return Ok(Created::empty());
    }
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => Ok(Created::new(value)),
        Err(_) if accept.tolerate_non_json => Ok(Created::empty()),
        Err(e) => Err(ApiError::Transport {
            message: format!("invalid JSON in response: {}", e),
            request: Some(context),
        }),
    }
}
