//! Request translation.
//!
//! # Responsibilities
//! - Resolve upstream resource URLs from the configured base
//! - Append the access token as the only query pair
//! - Enforce required path parameters before anything leaves the process
//! - Pick the body forwarded upstream for each operation
//!
//! # Upstream Resources
//! ```text
//! Fetch        GET   {base}/deposit/depositions[/{id}]
//! Create       POST  {base}/deposit/depositions
//! Update       PUT   {base}/deposit/depositions/{id}
//! Upload       PUT   {base}/files/{bucket}/{file}
//! Publish      POST  {base}/deposit/depositions/{id}/actions/publish
//! ```

use std::fmt;

use axum::body::Bytes;
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::config::schema::{AccessToken, UpstreamConfig, REDACTED};
use crate::gateway::error::GatewayError;
use crate::gateway::params::{DepositionReference, FileTarget};

/// Query parameter carrying the credential.
pub const CREDENTIAL_PARAM: &str = "access_token";

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// The five operations the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Fetch,
    Create,
    UpdateMetadata,
    UploadFile,
    Publish,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Fetch => "fetch",
            OperationKind::Create => "create",
            OperationKind::UpdateMetadata => "update_metadata",
            OperationKind::UploadFile => "upload_file",
            OperationKind::Publish => "publish",
        }
    }

    /// Upstream HTTP method.
    pub fn method(self) -> Method {
        match self {
            OperationKind::Fetch => Method::GET,
            OperationKind::Create | OperationKind::Publish => Method::POST,
            OperationKind::UpdateMetadata | OperationKind::UploadFile => Method::PUT,
        }
    }
}

/// Outbound channel an upstream call travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficClass {
    Read,
    Write,
}

impl TrafficClass {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD {
            TrafficClass::Read
        } else {
            TrafficClass::Write
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficClass::Read => "read",
            TrafficClass::Write => "write",
        }
    }
}

/// Base URL plus credential. Read-only after startup.
#[derive(Debug, Clone)]
pub struct UpstreamEndpoint {
    base: Url,
    credential: AccessToken,
}

impl UpstreamEndpoint {
    pub fn new(base_url: &str, credential: AccessToken) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self { base, credential })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, url::ParseError> {
        Self::new(&config.base_url, config.access_token.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn credential(&self) -> &AccessToken {
        &self.credential
    }

    /// Append `segments` to the base path and attach the credential.
    pub fn resolve<I>(&self, segments: I) -> Url
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut()
            .append_pair(CREDENTIAL_PARAM, self.credential.expose());
        url
    }

    fn collection(&self) -> Url {
        self.resolve(["deposit", "depositions"])
    }

    fn record(&self, id: DepositionReference) -> Url {
        self.resolve(["deposit", "depositions", &id.to_string()])
    }

    fn publish(&self, id: DepositionReference) -> Url {
        self.resolve(["deposit", "depositions", &id.to_string(), "actions", "publish"])
    }

    fn file(&self, target: &FileTarget) -> Url {
        self.resolve(["files", target.bucket.as_str(), target.file_name.as_str()])
    }
}

/// Everything the dispatcher bound from one inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub kind: OperationKind,
    pub deposition: Option<DepositionReference>,
    pub bucket: Option<String>,
    pub file_name: Option<String>,
    pub body: Option<Bytes>,
}

impl InboundRequest {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            deposition: None,
            bucket: None,
            file_name: None,
            body: None,
        }
    }

    pub fn with_deposition(mut self, deposition: Option<DepositionReference>) -> Self {
        self.deposition = deposition;
        self
    }

    pub fn with_target(mut self, bucket: Option<String>, file_name: Option<String>) -> Self {
        self.bucket = bucket;
        self.file_name = file_name;
        self
    }

    /// An empty body counts as absent.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = (!body.is_empty()).then_some(body);
        self
    }
}

/// One fully resolved upstream call.
#[derive(Clone)]
pub struct UpstreamRequest {
    pub kind: OperationKind,
    pub method: Method,
    /// Full URL, credential included.
    pub url: Url,
    pub body: Option<Bytes>,
    pub content_type: Option<&'static str>,
    pub class: TrafficClass,
}

impl UpstreamRequest {
    fn new(kind: OperationKind, url: Url, body: Option<Bytes>, content_type: Option<&'static str>) -> Self {
        let method = kind.method();
        Self {
            kind,
            class: TrafficClass::for_method(&method),
            method,
            url,
            body,
            content_type,
        }
    }

    /// URL safe for logs.
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamRequest")
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("content_type", &self.content_type)
            .field("class", &self.class)
            .finish()
    }
}

/// Render `url` with the credential value masked.
pub fn redact_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == CREDENTIAL_PARAM {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut shown = url.clone();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

/// Build the upstream call for `inbound`.
pub fn translate(endpoint: &UpstreamEndpoint, inbound: &InboundRequest) -> Result<UpstreamRequest, GatewayError> {
    let kind = inbound.kind;
    let request = match kind {
        OperationKind::Fetch => {
            let url = match inbound.deposition {
                Some(id) => endpoint.record(id),
                None => endpoint.collection(),
            };
            UpstreamRequest::new(kind, url, None, None)
        }
        OperationKind::Create => {
            let body = create_body(inbound.body.as_ref());
            UpstreamRequest::new(kind, endpoint.collection(), Some(body), Some(JSON))
        }
        OperationKind::UpdateMetadata => {
            let id = DepositionReference::require(inbound.deposition)?;
            let body = inbound.body.clone().unwrap_or_default();
            UpstreamRequest::new(kind, endpoint.record(id), Some(body), Some(JSON))
        }
        OperationKind::UploadFile => {
            let target = FileTarget::bind(inbound.bucket.as_deref(), inbound.file_name.as_deref())?;
            let body = inbound.body.clone().unwrap_or_default();
            UpstreamRequest::new(kind, endpoint.file(&target), Some(body), Some(OCTET_STREAM))
        }
        OperationKind::Publish => {
            let id = DepositionReference::require(inbound.deposition)?;
            UpstreamRequest::new(kind, endpoint.publish(id), None, None)
        }
    };
    Ok(request)
}

/// The inbound body if it is a JSON object, `{}` otherwise.
fn create_body(body: Option<&Bytes>) -> Bytes {
    const EMPTY_OBJECT: &[u8] = b"{}";

    let Some(raw) = body else {
        tracing::warn!("Create request has no body, sending empty object upstream");
        return Bytes::from_static(EMPTY_OBJECT);
    };

    match serde_json::from_slice::<Map<String, Value>>(raw) {
        Ok(_) => raw.clone(),
        Err(e) => {
            tracing::warn!(error = %e, "Create body is not a JSON object, sending empty object upstream");
            Bytes::from_static(EMPTY_OBJECT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "tok-123";

    fn endpoint() -> UpstreamEndpoint {
        UpstreamEndpoint::new("https://zenodo.example/api", AccessToken::new(TOKEN)).unwrap()
    }

    fn inbound(kind: OperationKind) -> InboundRequest {
        InboundRequest::new(kind)
    }

    #[test]
    fn test_fetch_collection_and_record() {
        let req = translate(&endpoint(), &inbound(OperationKind::Fetch)).unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.class, TrafficClass::Read);
        assert_eq!(
            req.url.as_str(),
            "https://zenodo.example/api/deposit/depositions?access_token=tok-123"
        );
        assert!(req.body.is_none());

        let one = inbound(OperationKind::Fetch).with_deposition(DepositionReference::new(1234));
        let req = translate(&endpoint(), &one).unwrap();
        assert_eq!(req.url.path(), "/api/deposit/depositions/1234");
    }

    #[test]
    fn test_trailing_slash_base() {
        let endpoint = UpstreamEndpoint::new("http://up.local/api/", AccessToken::new(TOKEN)).unwrap();
        let req = translate(&endpoint, &inbound(OperationKind::Fetch)).unwrap();
        assert_eq!(req.url.path(), "/api/deposit/depositions");
    }

    #[test]
    fn test_create_forwards_object_verbatim() {
        let body = Bytes::from_static(br#"{ "metadata": {"title": "x"} }"#);
        let req = translate(&endpoint(), &inbound(OperationKind::Create).with_body(body.clone())).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.class, TrafficClass::Write);
        assert_eq!(req.body, Some(body));
        assert_eq!(req.content_type, Some("application/json"));
    }

    #[test]
    fn test_create_falls_back_to_empty_object() {
        for body in [&b"not json"[..], &b"[1,2]"[..], &b""[..]] {
            let req = translate(
                &endpoint(),
                &inbound(OperationKind::Create).with_body(Bytes::copy_from_slice(body)),
            )
            .unwrap();
            assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
        }

        let req = translate(&endpoint(), &inbound(OperationKind::Create)).unwrap();
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_update_requires_id_and_keeps_bytes() {
        let err = translate(&endpoint(), &inbound(OperationKind::UpdateMetadata)).unwrap_err();
        assert!(matches!(err, GatewayError::Binding(_)));

        let body = Bytes::from_static(b"{\"metadata\":  {\"title\":\"t\"}}\n");
        let req = translate(
            &endpoint(),
            &inbound(OperationKind::UpdateMetadata)
                .with_deposition(DepositionReference::new(9))
                .with_body(body.clone()),
        )
        .unwrap();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.url.path(), "/api/deposit/depositions/9");
        assert_eq!(req.body, Some(body));
    }

    #[test]
    fn test_upload_targets_bucket_file() {
        let req = translate(
            &endpoint(),
            &inbound(OperationKind::UploadFile)
                .with_target(Some("5a1b-c2".into()), Some("read me.md".into()))
                .with_body(Bytes::from_static(b"\x00\x01binary")),
        )
        .unwrap();
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.url.path(), "/api/files/5a1b-c2/read%20me.md");
        assert_eq!(req.content_type, Some("application/octet-stream"));
        assert_eq!(req.body.as_deref(), Some(&b"\x00\x01binary"[..]));
    }

    #[test]
    fn test_upload_missing_segment() {
        let missing_file = inbound(OperationKind::UploadFile).with_target(Some("bucket".into()), None);
        assert!(matches!(
            translate(&endpoint(), &missing_file),
            Err(GatewayError::Binding(_))
        ));

        let missing_bucket = inbound(OperationKind::UploadFile).with_target(None, Some("f".into()));
        assert!(matches!(
            translate(&endpoint(), &missing_bucket),
            Err(GatewayError::Binding(_))
        ));
    }

    #[test]
    fn test_upload_dot_segments_never_resolve() {
        for (bucket, file) in [("b", ".."), ("b", "."), ("..", "readme.md"), (".", "readme.md")] {
            let req = inbound(OperationKind::UploadFile).with_target(Some(bucket.into()), Some(file.into()));
            assert!(
                matches!(translate(&endpoint(), &req), Err(GatewayError::Binding(_))),
                "{bucket}/{file}"
            );
        }
    }

    #[test]
    fn test_publish() {
        assert!(translate(&endpoint(), &inbound(OperationKind::Publish)).is_err());

        let req = translate(
            &endpoint(),
            &inbound(OperationKind::Publish).with_deposition(DepositionReference::new(77)),
        )
        .unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.path(), "/api/deposit/depositions/77/actions/publish");
        assert!(req.body.is_none());
    }

    #[test]
    fn test_credential_only_in_query() {
        let req = translate(
            &endpoint(),
            &inbound(OperationKind::Publish).with_deposition(DepositionReference::new(1)),
        )
        .unwrap();
        assert_eq!(req.url.query(), Some("access_token=tok-123"));
        assert!(!req.url.path().contains(TOKEN));
        assert!(!req.redacted_url().contains(TOKEN));
        assert!(req.redacted_url().ends_with("access_token=***"));
        assert!(!format!("{:?}", req).contains(TOKEN));
    }
}
