//! Handler output and response shaping.
//!
//! A handler produces a [`HandlerOutput`], the variant matching its endpoint
//! kind. [`shape`] turns that into a [`Response`]: a host-neutral description
//! of status, headers, content type, cookies and body. Template bodies are
//! left for the host to render.
//!
//! | Endpoint | Output | Response |
//! |---|---|---|
//! | page | [`HandlerOutput::Page`] | 200, [`Body::Template`] |
//! | api | [`HandlerOutput::Api`] | 200, text for strings and scalars, JSON otherwise |
//! | api cookie | [`HandlerOutput::Cookies`] | 200, one cookie per entry, empty body |
//! | download | [`HandlerOutput::Download`] | 200, declared content type, `Content-Disposition` |
//! | upload | [`HandlerOutput::Upload`] | 200, plain acknowledgement |
//! | css / js | [`HandlerOutput::Asset`] | 200, `text/css` / `text/javascript` |

use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::endpoint::{EndpointDescriptor, EndpointKind};
use crate::error::EndpointError;
use crate::plugin::EndpointConfig;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

// ─────────────────────────────────────────────────────────────────────────────
// HandlerOutput
// ─────────────────────────────────────────────────────────────────────────────

/// Body of an api response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// Sent as-is with a text content type.
    Text(String),
    /// Sent as `application/json`.
    Json(Value),
}

/// What a handler returned, tagged by endpoint kind.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// Template variables.
    Page(Map<String, Value>),
    /// Api value.
    Api(ApiBody),
    /// Cookie name to value.
    Cookies(IndexMap<String, String>),
    /// Download payload.
    Download(Bytes),
    /// Upload handled; nothing to send back but the acknowledgement.
    Upload,
    /// Stylesheet or script source.
    Asset(String),
}

impl HandlerOutput {
    /// Template variables from any value serializing to a map or struct.
    ///
    /// # Errors
    ///
    /// [`EndpointError::Serialization`] if `model` fails to serialize or does
    /// not serialize to a JSON object.
    pub fn page<T: Serialize + ?Sized>(model: &T) -> Result<Self, EndpointError> {
        match serde_json::to_value(model)? {
            Value::Object(map) => Ok(Self::Page(map)),
            other => Err(EndpointError::Serialization(serde::ser::Error::custom(
                format!("template model must be a map, got {}", json_kind(&other)),
            ))),
        }
    }

    /// An api value. Strings, numbers and booleans become text; everything
    /// else becomes JSON.
    ///
    /// # Errors
    ///
    /// [`EndpointError::Serialization`] if `value` fails to serialize.
    pub fn api<T: Serialize + ?Sized>(value: &T) -> Result<Self, EndpointError> {
        let body = match serde_json::to_value(value)? {
            Value::String(text) => ApiBody::Text(text),
            Value::Number(number) => ApiBody::Text(number.to_string()),
            Value::Bool(flag) => ApiBody::Text(flag.to_string()),
            other => ApiBody::Json(other),
        };
        Ok(Self::Api(body))
    }

    /// Cookies from name/value pairs.
    pub fn cookies<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Cookies(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// A download payload.
    pub fn download(content: impl Into<Bytes>) -> Self {
        Self::Download(content.into())
    }

    /// Stylesheet or script source.
    pub fn asset(source: impl Into<String>) -> Self {
        Self::Asset(source.into())
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Api(_) => "api",
            Self::Cookies(_) => "cookies",
            Self::Download(_) => "download",
            Self::Upload => "upload",
            Self::Asset(_) => "asset",
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

/// Response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Text body.
    Text(String),
    /// Binary body.
    Bytes(Bytes),
    /// A template for the host to render with `model`.
    Template {
        /// Template path.
        path: String,
        /// Template variables.
        model: Map<String, Value>,
    },
}

impl Body {
    /// Text content, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Raw content for text and binary bodies.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Bytes(bytes) => Some(bytes),
            Self::Empty | Self::Template { .. } => None,
        }
    }

    /// Returns `true` for [`Body::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A response description handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<String>,
    cookies: IndexMap<String, String>,
    body: Body,
}

impl Response {
    /// An empty response with `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content_type: None,
            cookies: IndexMap::new(),
            body: Body::Empty,
        }
    }

    /// An empty `200 OK`.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A plain-text response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status)
            .with_content_type(TEXT_PLAIN)
            .with_body(Body::Text(text.into()))
    }

    /// A plain-text response whose body is the status' canonical reason.
    #[must_use]
    pub fn status_only(status: StatusCode) -> Self {
        Self::text(status, status.canonical_reason().unwrap_or_default())
    }

    /// The response for a request that failed with `error`.
    ///
    /// The error message is only sent for client errors, and only when
    /// `echo_errors` is set.
    #[must_use]
    pub fn from_error(error: &EndpointError, echo_errors: bool) -> Self {
        let status = error.status();
        if echo_errors && status.is_client_error() {
            Self::text(status, error.to_string())
        } else {
            Self::status_only(status)
        }
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers other than the content type.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, if present and valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Cookies to set.
    #[must_use]
    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    /// Body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shaping
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the response for a handler's output.
///
/// # Errors
///
/// [`EndpointError::Invocation`] if the output variant does not belong to the
/// endpoint kind, or a download file name cannot be sent as a header.
pub fn shape(
    endpoint: &EndpointDescriptor,
    output: HandlerOutput,
    config: &EndpointConfig,
) -> Result<Response, EndpointError> {
    let response = Response::ok();
    match (endpoint.kind(), output) {
        (EndpointKind::Page { template }, HandlerOutput::Page(model)) => Ok(response
            .with_content_type(TEXT_HTML)
            .with_body(Body::Template {
                path: template.clone(),
                model,
            })),
        (EndpointKind::Api, HandlerOutput::Api(ApiBody::Text(text))) => {
            Ok(response.with_content_type(TEXT_PLAIN).with_body(Body::Text(text)))
        }
        (EndpointKind::Api, HandlerOutput::Api(ApiBody::Json(value))) => Ok(response
            .with_content_type(APPLICATION_JSON)
            .with_body(Body::Text(value.to_string()))),
        (EndpointKind::ApiCookie, HandlerOutput::Cookies(cookies)) => Ok(cookies
            .into_iter()
            .fold(response, |response, (name, value)| response.with_cookie(name, value))),
        (
            EndpointKind::Download {
                content_type,
                filename,
            },
            HandlerOutput::Download(content),
        ) => {
            let disposition = HeaderValue::try_from(format!("attachment; filename={filename}"))
                .map_err(|err| EndpointError::invocation(endpoint.path(), err))?;
            Ok(response
                .with_content_type(content_type.as_str())
                .with_header(CONTENT_DISPOSITION, disposition)
                .with_body(Body::Bytes(content)))
        }
        (EndpointKind::Upload, HandlerOutput::Upload) => Ok(response
            .with_content_type(TEXT_PLAIN)
            .with_body(Body::Text(config.upload_ack().to_owned()))),
        (EndpointKind::StaticAsset(asset), HandlerOutput::Asset(source)) => Ok(response
            .with_content_type(asset.content_type())
            .with_body(Body::Text(source))),
        (kind, output) => Err(EndpointError::invocation(
            endpoint.path(),
            format!("{kind} endpoint cannot send {} output", output.name()),
        )),
    }
}
