//! Integration tests: `#[endpoints]` types discovered, exposed on a
//! [`MemoryHost`] and dispatched end to end.

use chrono::NaiveDate;
use http::{Method, StatusCode};
use serde::Serialize;
use waymark_endpoints::host::memory::MemoryHost;
use waymark_endpoints::{
    Body, EndpointError, EndpointKind, ExposeEndpoints, RequestData, RoleRegistry, SourceKind,
    TargetType, UploadedFile, discover_namespace, discover_type, endpoints,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Admin,
    User,
}

fn roles() -> RoleRegistry<Role> {
    [("ADMIN", Role::Admin), ("USER", Role::User)]
        .into_iter()
        .collect()
}

fn get(host: &MemoryHost<Role>, target: &str) -> waymark_endpoints::Response {
    host.handle(&Method::GET, target, RequestData::new(), &[])
}

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

mod sample {
    pub mod first {
        use waymark_endpoints::endpoints;

        #[derive(Default)]
        pub struct FirstExposedClass;

        #[endpoints]
        impl FirstExposedClass {
            #[api(GET, "/api/first")]
            fn first(&self) -> &'static str {
                "API response for FirstExposedClass"
            }
        }

        pub mod second {
            use waymark_endpoints::endpoints;

            #[derive(Default)]
            pub struct SecondExposedClass;

            #[endpoints]
            impl SecondExposedClass {
                #[api(GET, "/api/second/int")]
                fn int(&self) -> i64 {
                    42
                }

                #[api(GET, "/api/second/bool")]
                fn boolean(&self) -> bool {
                    false
                }

                #[api(GET, "/api/second/string")]
                fn string() -> String {
                    String::from("Validate: åäöÅÄÖ%&?")
                }
            }
        }
    }

    pub mod third {
        use waymark_endpoints::endpoints;

        #[derive(Default)]
        pub struct ThirdExposedClass;

        #[endpoints]
        impl ThirdExposedClass {
            #[api(GET, "/third")]
            fn third(&self) -> &'static str {
                "API response for ThirdExposedClass"
            }
        }
    }
}

#[derive(Serialize)]
struct DayModel {
    owner: String,
    date: NaiveDate,
}

struct AnnotatedClass {
    owner: String,
}

impl Default for AnnotatedClass {
    fn default() -> Self {
        Self {
            owner: String::from("archive"),
        }
    }
}

#[endpoints]
impl AnnotatedClass {
    /// Everything filed on one day.
    #[page(GET, "/day/{date}", template = "day.html")]
    fn day(&self, #[param("date", route)] date: NaiveDate) -> DayModel {
        DayModel {
            owner: self.owner.clone(),
            date,
        }
    }

    #[api(GET, "/api/args/{date}/{count}")]
    fn args(
        &self,
        #[param("date", route)] date: NaiveDate,
        #[param("count", route)] count: i64,
        #[param("flag", query)] flag: bool,
    ) -> String {
        format!("{date} {count} {flag}")
    }

    #[api(GET, "/api/search", description = "Lenient query parameters")]
    fn search(
        &self,
        #[param("q", query)] query: String,
        #[param("limit", query)] limit: i64,
    ) -> String {
        format!("[{query}] {limit}")
    }

    #[api(GET, "/api/admin/stats", role = "ADMIN")]
    fn stats(&self) -> Vec<u32> {
        vec![1, 2, 3]
    }

    #[api(POST, "/api/fail")]
    fn fail(&self) -> Result<String, std::io::Error> {
        Err(std::io::Error::other("disk on fire"))
    }

    #[api_cookie(GET, "/api/cookies")]
    fn cookies(&self) -> Vec<(&'static str, &'static str)> {
        vec![("a", "1"), ("b", "2")]
    }

    #[download(GET, "/export.csv", content_type = "text/csv", filename = "export.csv", role = "USER")]
    fn export(&self) -> Vec<u8> {
        b"year,count\n2020,7\n".to_vec()
    }

    #[upload("/files")]
    fn upload(
        &self,
        #[param("file", file)] name: String,
        #[param("file", file)] content: Vec<u8>,
        #[param("session", cookie)] session: String,
    ) {
        assert_eq!(name, "notes.txt");
        assert_eq!(content, b"hello");
        assert!(session.is_empty());
    }

    #[api(POST, "/api/echo")]
    fn echo(&self, #[param("body", body)] body: String, #[param("tag", form)] tag: String) -> String {
        format!("{tag}:{body}")
    }

    #[css("/site.css")]
    fn site_css() -> &'static str {
        "body { margin: 0 }"
    }

    fn helper(&self) -> usize {
        self.owner.len()
    }
}

#[derive(Default)]
struct Guarded;

#[endpoints]
impl Guarded {
    #[api(GET, "/api/guarded", role = "SUPERUSER")]
    fn guarded(&self) -> i64 {
        1
    }
}

#[derive(Default)]
struct Volatile;

#[endpoints]
impl Volatile {
    #[api(GET, "/boom")]
    fn boom(&self) -> String {
        panic!("ledger unavailable")
    }

    #[api(GET, "/echo/{name}")]
    fn echo(&self, #[param("name", route)] name: String) -> String {
        name
    }
}

fn volatile_host() -> MemoryHost<Role> {
    let mut host: MemoryHost<Role> = MemoryHost::new();
    host.expose_type::<Volatile>(&roles()).unwrap();
    host
}

fn archive_host() -> MemoryHost<Role> {
    let mut host: MemoryHost<Role> = MemoryHost::new();
    host.expose_type::<AnnotatedClass>(&roles()).unwrap();
    host
}

// ─────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn type_discovery_finds_every_annotated_method() {
    let routes = discover_type::<AnnotatedClass>().unwrap();
    let paths: Vec<_> = routes.iter().map(|route| route.endpoint().path()).collect();

    assert_eq!(
        paths,
        vec![
            "/day/{date}",
            "/api/args/{date}/{count}",
            "/api/search",
            "/api/admin/stats",
            "/api/fail",
            "/api/cookies",
            "/export.csv",
            "/files",
            "/api/echo",
            "/site.css",
        ]
    );
    assert_eq!(AnnotatedClass::default().helper(), 7);

    let day = &routes[0];
    assert_eq!(day.endpoint().description(), "Everything filed on one day.");
    assert!(matches!(day.endpoint().kind(), EndpointKind::Page { template } if template == "day.html"));
    assert_eq!(day.declared_in(), "AnnotatedClass");

    let args = &routes[1];
    let declared: Vec<_> = args
        .parameters()
        .iter()
        .map(|param| (param.name(), param.source(), param.target()))
        .collect();
    assert_eq!(
        declared,
        vec![
            ("date", SourceKind::Route, TargetType::Date),
            ("count", SourceKind::Route, TargetType::Integer),
            ("flag", SourceKind::Query, TargetType::Boolean),
        ]
    );

    assert_eq!(routes[2].endpoint().description(), "Lenient query parameters");
    assert_eq!(routes[3].endpoint().access_role(), "ADMIN");
    assert_eq!(routes[7].endpoint().method(), &Method::POST);
    assert_eq!(routes[9].endpoint().method(), &Method::GET);
    assert!(routes[9].endpoint().is_public());
}

#[test]
fn namespace_discovery_excludes_siblings() {
    let first = discover_namespace(concat!(module_path!(), "::sample::first")).unwrap();
    let paths: Vec<_> = first.iter().map(|route| route.endpoint().path()).collect();
    assert_eq!(
        paths,
        vec!["/api/first", "/api/second/int", "/api/second/bool", "/api/second/string"]
    );

    let all = discover_namespace(concat!(module_path!(), "::sample")).unwrap();
    assert_eq!(all.len(), 5);
}

#[test]
fn namespace_exposure_dispatches_contained_types_only() {
    let mut host: MemoryHost<Role> = MemoryHost::new();
    host.expose_namespace(concat!(module_path!(), "::sample::first"), &roles())
        .unwrap();

    assert_eq!(
        get(&host, "/api/first").body().as_text(),
        Some("API response for FirstExposedClass")
    );
    assert_eq!(get(&host, "/api/second/int").body().as_text(), Some("42"));
    assert_eq!(get(&host, "/api/second/bool").body().as_text(), Some("false"));
    assert_eq!(
        get(&host, "/api/second/string").body().as_text(),
        Some("Validate: åäöÅÄÖ%&?")
    );
    assert_eq!(get(&host, "/third").status(), StatusCode::NOT_FOUND);
}

// ─────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────

#[test]
fn route_and_query_arguments_are_typed() {
    let host = archive_host();

    let response = get(&host, "/api/args/2020-10-20/5?flag=false");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_text(), Some("2020-10-20 5 false"));
}

#[test]
fn unparsable_date_is_a_client_error() {
    let host = archive_host();

    let response = get(&host, "/api/args/julgran/5?flag=true");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body().as_text(),
        Some("Could not parse 'date' to 'Date'")
    );
}

#[test]
fn lenient_query_defaults() {
    let host = archive_host();

    assert_eq!(get(&host, "/api/search").body().as_text(), Some("[] -1"));
    assert_eq!(
        get(&host, "/api/search?q=rust&limit=10").body().as_text(),
        Some("[rust] 10")
    );
    assert_eq!(
        get(&host, "/api/search?limit=ten").status(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn body_and_form_arguments() {
    let host = archive_host();
    let request = RequestData::new()
        .with_form_body("tag=note")
        .with_body("payload");

    let response = host.handle(&Method::POST, "/api/echo", request, &[]);
    assert_eq!(response.body().as_text(), Some("note:payload"));
}

// ─────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────

#[test]
fn page_renders_model_into_template() {
    let host = archive_host();

    let response = get(&host, "/day/2020-10-20");
    assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
    let Body::Template { path, model } = response.body() else {
        panic!("expected a template body");
    };
    assert_eq!(path, "day.html");
    assert_eq!(model["owner"], "archive");
    assert_eq!(model["date"], "2020-10-20");
}

#[test]
fn cookies_have_no_body() {
    let host = archive_host();

    let response = get(&host, "/api/cookies");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.cookies().len(), 2);
    assert_eq!(response.cookies()["a"], "1");
    assert_eq!(response.cookies()["b"], "2");
    assert!(response.body().is_empty());
}

#[test]
fn download_sends_bytes_as_attachment() {
    let host = archive_host();

    let response = host.handle(&Method::GET, "/export.csv", RequestData::new(), &[Role::User]);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("text/csv"));
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=export.csv")
    );
    assert_eq!(response.body().as_bytes(), Some(&b"year,count\n2020,7\n"[..]));
}

#[test]
fn upload_is_acknowledged() {
    let host = archive_host();
    let request = RequestData::new().with_file("file", UploadedFile::new("notes.txt", "hello"));

    let response = host.handle(&Method::POST, "/files", request, &[]);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_text(), Some("Upload received"));
}

#[test]
fn static_asset_has_fixed_content_type() {
    let host = archive_host();

    let response = get(&host, "/site.css");
    assert_eq!(response.content_type(), Some("text/css"));
    assert_eq!(response.body().as_text(), Some("body { margin: 0 }"));
}

#[test]
fn handler_failure_is_a_server_error() {
    let host = archive_host();

    let response = host.handle(&Method::POST, "/api/fail", RequestData::new(), &[]);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(response.body().as_text(), Some("disk on fire"));
}

#[test]
fn panicking_handler_is_a_server_error() {
    let host = volatile_host();

    let response = get(&host, "/boom");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let after = get(&host, "/echo/still-up");
    assert_eq!(after.body().as_text(), Some("still-up"));
}

#[test]
fn route_segments_are_percent_decoded() {
    let host = volatile_host();

    assert_eq!(get(&host, "/echo/a%20b").body().as_text(), Some("a b"));
    assert_eq!(get(&host, "/echo/%C3%A5%C3%A4%C3%B6").body().as_text(), Some("åäö"));
    assert_eq!(get(&host, "/echo/%FF").status(), StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────

#[test]
fn admin_route_rejects_other_roles() {
    let host = archive_host();

    assert_eq!(
        host.required_roles(&Method::GET, "/api/admin/stats"),
        Some(&[Role::Admin][..])
    );

    let denied = host.handle(&Method::GET, "/api/admin/stats", RequestData::new(), &[Role::User]);
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let allowed = host.handle(&Method::GET, "/api/admin/stats", RequestData::new(), &[Role::Admin]);
    assert_eq!(allowed.content_type(), Some("application/json"));
    assert_eq!(allowed.body().as_text(), Some("[1,2,3]"));
}

#[test]
fn unknown_role_fails_exposure() {
    let mut host: MemoryHost<Role> = MemoryHost::new();

    let err = host.expose_type::<Guarded>(&roles()).unwrap_err();
    assert!(matches!(err, EndpointError::RoleNotFound(ref name) if name == "SUPERUSER"));
    assert_eq!(err.to_string(), "No role matching 'SUPERUSER'");
    assert!(err.is_configuration());
    assert!(host.is_empty());
}
