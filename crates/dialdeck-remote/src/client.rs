use std::time::Duration;

use dialdeck_core::dialer::{OutcomeSink, SinkError};
use dialdeck_core::domain::{Contact, ContactId, OutcomeCatalog, OutcomeDraft};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::{RemoteError, Result};
use crate::wire::{
    catalog_from_wire, OutcomeLabelWire, OutcomeRequest, ProspectWire, TokenRequest, TokenResponse,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const CALLING_LIST_PATH: &str = "prospects/calling-list";
const CALL_OUTCOME_PATH: &str = "call-outcome";
const CALL_OUTCOMES_PATH: &str = "call-outcomes";
const TOKEN_PATH: &str = "twilio/token";
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

/// Blocking client for the CRM backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
    api_token: Option<String>,
}

impl BackendClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base = parse_base_url(&options.base_url)?;
        let http = Client::builder()
            .user_agent(options.user_agent.as_deref().unwrap_or("dialdeck"))
            .timeout(options.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(options.timeout))
            .build()?;
        Ok(Self {
            http,
            base,
            api_token: options.api_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The calling list in call order, optionally narrowed to one contact.
    pub fn calling_list(&self, contact_id: Option<&ContactId>) -> Result<Vec<Contact>> {
        let mut url = self.endpoint(CALLING_LIST_PATH)?;
        if let Some(contact_id) = contact_id {
            url.query_pairs_mut()
                .append_pair("contactId", contact_id.as_str());
        }
        let items: Vec<ProspectWire> = self.read_json(self.http.get(url))?;
        let contacts = items
            .into_iter()
            .map(ProspectWire::into_contact)
            .collect::<Result<Vec<_>>>()?;
        debug!(contacts = contacts.len(), "calling list fetched");
        Ok(contacts)
    }

    /// Sends one outcome. The draft id travels as the idempotency key so a
    /// resend of the same draft can be recognised.
    pub fn post_outcome(&self, draft: &OutcomeDraft) -> Result<()> {
        let url = self.endpoint(CALL_OUTCOME_PATH)?;
        let request = self
            .http
            .post(url)
            .header(IDEMPOTENCY_HEADER, draft.id.to_string())
            .json(&OutcomeRequest::from(draft));
        self.send(request)?;
        debug!(outcome = %draft.id, contact = %draft.contact_id, "outcome posted");
        Ok(())
    }

    pub fn outcome_labels(&self) -> Result<OutcomeCatalog> {
        let url = self.endpoint(CALL_OUTCOMES_PATH)?;
        let items: Vec<OutcomeLabelWire> = self.read_json(self.http.get(url))?;
        catalog_from_wire(items)
    }

    /// Replaces the backend catalog with `catalog`.
    pub fn update_outcome_labels(&self, catalog: &OutcomeCatalog) -> Result<()> {
        let url = self.endpoint(CALL_OUTCOMES_PATH)?;
        let body: Vec<OutcomeLabelWire> = catalog.labels().iter().map(Into::into).collect();
        self.send(self.http.patch(url).json(&body))?;
        debug!(labels = body.len(), "outcome catalog updated");
        Ok(())
    }

    pub fn telephony_token(&self, identity: &str) -> Result<String> {
        let url = self.endpoint(TOKEN_PATH)?;
        let response: TokenResponse =
            self.read_json(self.http.post(url).json(&TokenRequest { identity }))?;
        if response.token.trim().is_empty() {
            return Err(RemoteError::Decode("empty telephony token".to_string()));
        }
        Ok(response.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().map_err(|err| {
            warn!(error = %err, "backend request failed");
            RemoteError::Http(err)
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|index| body.is_char_boundary(*index))
                .unwrap_or(0);
            body.truncate(cut);
        }
        warn!(status = status.as_u16(), "backend rejected request");
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn read_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request)?;
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

impl OutcomeSink for BackendClient {
    fn send_outcome(&self, draft: &OutcomeDraft) -> std::result::Result<(), SinkError> {
        self.post_outcome(draft).map_err(|err| {
            if matches!(err, RemoteError::Http(_)) || err.is_transient() {
                SinkError::new(err.to_string())
            } else {
                SinkError::rejected(err.to_string())
            }
        })
    }
}

/// Requires https except for loopback hosts; the path always ends in `/` so
/// endpoints join beneath it.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RemoteError::NotConfigured);
    }
    let mut url = Url::parse(trimmed)?;
    match url.scheme() {
        "https" => {}
        "http" if is_loopback(&url) => {}
        _ => return Err(RemoteError::InsecureUrl(trimmed.to_string())),
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
