//! The request surface handlers read their arguments from.
//!
//! Hosts adapt their native request type by implementing [`Request`]. All
//! lookups are by name over data the host has already buffered.
//! [`RequestData`] is an owned implementation, used by the in-memory host and
//! in tests.

use bytes::Bytes;
use indexmap::IndexMap;

/// A file received as part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    content: Bytes,
}

impl UploadedFile {
    /// Creates an uploaded file from its client-side name and content.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            content: content.into(),
        }
    }

    /// Sets the content type announced by the client.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name as sent by the client.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content type announced by the client, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Full file content.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Content length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Named lookups into an inbound request.
pub trait Request {
    /// Value captured by a `{name}` segment of the matched route.
    fn path_param(&self, name: &str) -> Option<&str>;

    /// First query-string value for `name`.
    fn query_param(&self, name: &str) -> Option<&str>;

    /// First form-field value for `name`.
    fn form_param(&self, name: &str) -> Option<&str>;

    /// Cookie value for `name`.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Uploaded file sent under the form field `name`.
    fn uploaded_file(&self, name: &str) -> Option<&UploadedFile>;

    /// Raw request body.
    fn body(&self) -> &[u8];
}

/// Owned request data.
///
/// ```
/// use waymark_endpoints::request::{Request, RequestData};
///
/// let request = RequestData::new()
///     .with_query_string("page=2&sort=name")
///     .with_cookie("session", "abc");
///
/// assert_eq!(request.query_param("page"), Some("2"));
/// assert_eq!(request.cookie("session"), Some("abc"));
/// assert_eq!(request.query_param("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    path: IndexMap<String, String>,
    query: IndexMap<String, String>,
    form: IndexMap<String, String>,
    cookies: IndexMap<String, String>,
    files: IndexMap<String, UploadedFile>,
    body: Bytes,
}

impl RequestData {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a route path parameter.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_path_param(name, value);
        self
    }

    /// Sets a route path parameter in place. Hosts call this after matching.
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path.insert(name.into(), value.into());
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds every pair of a url-encoded query string (without the leading `?`).
    ///
    /// Undecodable input is ignored. When a name repeats, the first value wins.
    #[must_use]
    pub fn with_query_string(mut self, raw: &str) -> Self {
        merge_urlencoded(&mut self.query, raw);
        self
    }

    /// Sets a form field.
    #[must_use]
    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Uses a url-encoded form as the body and exposes its fields as form
    /// parameters.
    #[must_use]
    pub fn with_form_body(mut self, raw: &str) -> Self {
        merge_urlencoded(&mut self.form, raw);
        self.body = Bytes::copy_from_slice(raw.as_bytes());
        self
    }

    /// Sets a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Attaches an uploaded file under a form field name.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

fn merge_urlencoded(target: &mut IndexMap<String, String>, raw: &str) {
    let Ok(pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(raw) else {
        tracing::debug!(raw, "ignoring undecodable url-encoded data");
        return;
    };
    for (name, value) in pairs {
        target.entry(name).or_insert(value);
    }
}

impl Request for RequestData {
    fn path_param(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn form_param(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn uploaded_file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_decoded() {
        let request = RequestData::new().with_query_string("q=%C3%A5%C3%A4%C3%B6&empty=&n=1&n=2");
        assert_eq!(request.query_param("q"), Some("åäö"));
        assert_eq!(request.query_param("empty"), Some(""));
        assert_eq!(request.query_param("n"), Some("1"));
    }

    #[test]
    fn form_body_populates_fields_and_body() {
        let request = RequestData::new().with_form_body("flag=true&name=a+b");
        assert_eq!(request.form_param("flag"), Some("true"));
        assert_eq!(request.form_param("name"), Some("a b"));
        assert_eq!(request.body(), b"flag=true&name=a+b");
    }

    #[test]
    fn uploaded_file_accessors() {
        let file = UploadedFile::new("notes.txt", "hello").with_content_type("text/plain");
        let request = RequestData::new().with_file("theFile", file);

        let file = request.uploaded_file("theFile").unwrap();
        assert_eq!(file.filename(), "notes.txt");
        assert_eq!(file.content_type(), Some("text/plain"));
        assert_eq!(file.size(), 5);
        assert!(request.uploaded_file("other").is_none());
    }

    #[test]
    fn path_params_are_set_in_place() {
        let mut request = RequestData::new();
        request.set_path_param("id", "7");
        assert_eq!(request.path_param("id"), Some("7"));
    }
}
