//! Endpoint descriptors: what a handler is exposed as.

use core::fmt;

use http::Method;

/// Kind of static asset served by a [`EndpointKind::StaticAsset`] endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Stylesheet, served as `text/css`.
    Css,
    /// Script, served as `text/javascript`.
    Js,
}

impl AssetKind {
    /// Content type the asset is served with.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Css => "text/css",
            Self::Js => "text/javascript",
        }
    }
}

/// The endpoint variant, with its variant-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointKind {
    /// Renders `template` with the handler's variable map.
    Page {
        /// Template path passed to the host's renderer.
        template: String,
    },
    /// Sends the handler's value as text or JSON.
    Api,
    /// Turns the handler's string map into response cookies.
    ApiCookie,
    /// Sends the handler's bytes as an attachment.
    Download {
        /// Content type of the payload.
        content_type: String,
        /// File name suggested to the client.
        filename: String,
    },
    /// Consumes uploaded data and acknowledges it.
    Upload,
    /// Serves a stylesheet or script.
    StaticAsset(AssetKind),
}

impl EndpointKind {
    /// Short lowercase name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Page { .. } => "page",
            Self::Api => "api",
            Self::ApiCookie => "api_cookie",
            Self::Download { .. } => "download",
            Self::Upload => "upload",
            Self::StaticAsset(AssetKind::Css) => "css",
            Self::StaticAsset(AssetKind::Js) => "js",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Method, path, access role and variant of one endpoint.
///
/// ```
/// use http::Method;
/// use waymark_endpoints::endpoint::{EndpointDescriptor, EndpointKind};
///
/// let endpoint = EndpointDescriptor::download(Method::GET, "/report", "text/csv", "report.csv")
///     .with_role("ADMIN")
///     .with_description("Monthly report");
///
/// assert_eq!(endpoint.access_role(), "ADMIN");
/// assert!(matches!(endpoint.kind(), EndpointKind::Download { .. }));
///
/// // Static assets are always public GET routes.
/// let css = EndpointDescriptor::css("/style.css").with_role("ADMIN");
/// assert_eq!(css.method(), &Method::GET);
/// assert!(css.is_public());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    method: Method,
    path: String,
    access_role: String,
    description: String,
    kind: EndpointKind,
}

impl EndpointDescriptor {
    fn new(method: Method, path: impl Into<String>, kind: EndpointKind) -> Self {
        Self {
            method,
            path: path.into(),
            access_role: String::new(),
            description: String::new(),
            kind,
        }
    }

    /// A page rendered from `template`.
    pub fn page(method: Method, path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(
            method,
            path,
            EndpointKind::Page {
                template: template.into(),
            },
        )
    }

    /// An API endpoint.
    pub fn api(method: Method, path: impl Into<String>) -> Self {
        Self::new(method, path, EndpointKind::Api)
    }

    /// An endpoint answering with cookies.
    pub fn api_cookie(method: Method, path: impl Into<String>) -> Self {
        Self::new(method, path, EndpointKind::ApiCookie)
    }

    /// A file download.
    pub fn download(
        method: Method,
        path: impl Into<String>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self::new(
            method,
            path,
            EndpointKind::Download {
                content_type: content_type.into(),
                filename: filename.into(),
            },
        )
    }

    /// A file upload, always `POST`.
    pub fn upload(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path, EndpointKind::Upload)
    }

    /// A stylesheet, always a public `GET`.
    pub fn css(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, EndpointKind::StaticAsset(AssetKind::Css))
    }

    /// A script, always a public `GET`.
    pub fn js(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, EndpointKind::StaticAsset(AssetKind::Js))
    }

    /// Requires the symbolic role `role`. An empty string keeps the endpoint
    /// public. Ignored for static assets.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        if matches!(self.kind, EndpointKind::StaticAsset(_)) {
            if !role.is_empty() {
                tracing::warn!(path = %self.path, role = %role, "static assets are public; ignoring role");
            }
            return self;
        }
        self.access_role = role;
        self
    }

    /// Sets a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route path, possibly containing `{name}` segments.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Symbolic access role; empty for public endpoints.
    #[must_use]
    pub fn access_role(&self) -> &str {
        &self.access_role
    }

    /// Returns `true` if no role is required.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access_role.is_empty()
    }

    /// Description, empty if none was given.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Endpoint variant.
    #[must_use]
    pub fn kind(&self) -> &EndpointKind {
        &self.kind
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_is_post() {
        let upload = EndpointDescriptor::upload("/files").with_role("USER");
        assert_eq!(upload.method(), &Method::POST);
        assert_eq!(upload.access_role(), "USER");
        assert_eq!(upload.kind(), &EndpointKind::Upload);
    }

    #[test]
    fn asset_content_types() {
        assert_eq!(AssetKind::Css.content_type(), "text/css");
        assert_eq!(AssetKind::Js.content_type(), "text/javascript");
        assert_eq!(EndpointDescriptor::js("/app.js").kind().name(), "js");
    }

    #[test]
    fn page_keeps_template_and_display() {
        let page = EndpointDescriptor::page(Method::GET, "/home", "templates/home.html");
        assert_eq!(
            page.kind(),
            &EndpointKind::Page {
                template: "templates/home.html".into()
            }
        );
        assert!(page.is_public());
        assert_eq!(page.to_string(), "GET /home (page)");
    }
}
