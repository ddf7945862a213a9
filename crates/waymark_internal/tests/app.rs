//! Integration tests through the re-export facade: plugins build the
//! role registry and route table, a host exposes the frozen table.

use waymark_internal::prelude::*;
use waymark_internal::waymark_endpoints::http::{Method, StatusCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Editor,
}

#[derive(Default)]
struct Articles;

#[endpoints]
impl Articles {
    #[api(GET, "/articles/{id}")]
    fn title(&self, #[param("id", route)] id: i64) -> String {
        format!("Article #{id}")
    }

    #[upload("/articles", role = "EDITOR")]
    fn create(&self, #[param("body", body)] _markdown: String) {}
}

/// Adds a hand-built route to the mutable table during `build()`.
struct HealthPlugin;

impl Plugin for HealthPlugin {
    fn build(&self, app: &mut App) {
        let route = RouteDescriptor::builder(EndpointDescriptor::api(Method::GET, "/health"))
            .handler(|_| HandlerOutput::api("ok"))
            .expect("health route is valid");
        app.get_resource_mut::<RouteTable>()
            .expect("EndpointsPlugin builds first")
            .add_route(route);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<EndpointsPlugin>()]
    }
}

fn started_app() -> App {
    let mut app = App::new();
    app.add_plugins(HealthPlugin)
        .add_plugins(RolesPlugin::new([("EDITOR", Role::Editor)]))
        .add_plugins(
            EndpointsPlugin::new()
                .with_type::<Articles>()
                .with_upload_ack("Article stored"),
        );
    app.finish();
    app
}

#[test]
fn plugins_freeze_roles_and_routes() {
    let app = started_app();

    let table = app.get_global::<RouteTable>().unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.get(&Method::POST, "/articles").is_some());
    assert!(app.get_global::<RoleRegistry<Role>>().unwrap().contains("EDITOR"));
}

#[test]
fn frozen_table_is_served_by_a_host() {
    let app = started_app();
    let table = app.get_global::<RouteTable>().unwrap();
    let roles = app.get_global::<RoleRegistry<Role>>().unwrap();
    let config = app.get_global::<EndpointConfig>().unwrap();

    let mut host: MemoryHost<Role> = MemoryHost::new();
    host.expose_table(&table, &roles, &config).unwrap();

    let title = host.handle(&Method::GET, "/articles/12", RequestData::new(), &[]);
    assert_eq!(title.body().as_text(), Some("Article #12"));

    let bad_id = host.handle(&Method::GET, "/articles/twelve", RequestData::new(), &[]);
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

    let anonymous = host.handle(&Method::POST, "/articles", RequestData::new(), &[]);
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let stored = host.handle(
        &Method::POST,
        "/articles",
        RequestData::new().with_body("# Hello"),
        &[Role::Editor],
    );
    assert_eq!(stored.body().as_text(), Some("Article stored"));

    assert_eq!(
        host.handle(&Method::GET, "/health", RequestData::new(), &[])
            .body()
            .as_text(),
        Some("ok")
    );
}

#[test]
fn minimal_plugins_provide_an_empty_table() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins.build());
    app.finish();

    assert!(app.get_global::<RouteTable>().unwrap().is_empty());
    assert_eq!(
        app.get_global::<EndpointConfig>().unwrap().upload_ack(),
        "Upload received"
    );
}
