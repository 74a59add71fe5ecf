use std::sync::Arc;

use corridor::pipeline::{stage_fn, Next, Stage};
use corridor::router::Router;
use corridor::RouteError;
use http::Method;

struct Ctx;

fn handler() -> Stage<Ctx> {
    stage_fn(|ctx: Arc<Ctx>, next: Next<Ctx>| async move { next.run(ctx).await })
}

fn assert_route(router: &Router<Ctx>, method: Method, path: &str, expected: &str) {
    match router.find(&method, path) {
        Some(found) => assert_eq!(
            found.route.name(),
            expected,
            "route mismatch for {method} {path}: expected '{expected}', got '{}'",
            found.route.name()
        ),
        None => assert_eq!(
            expected, "<none>",
            "expected a route to match for {method} {path}"
        ),
    }
}

fn verb_zoo() -> Router<Ctx> {
    let mut router: Router<Ctx> = Router::new();
    router.get("/", handler()).unwrap().set_name("root");
    router
        .get("/zoo/animals", handler())
        .unwrap()
        .set_name("list_animals");
    router
        .post("/zoo/animals", handler())
        .unwrap()
        .set_name("create_animal");
    router
        .get("/zoo/animals/:id", handler())
        .unwrap()
        .set_name("get_animal");
    router
        .delete("/zoo/animals/:id", handler())
        .unwrap()
        .set_name("delete_animal");
    router
        .head("/zoo/health", handler())
        .unwrap()
        .set_name("health_check");
    router
}

#[test]
fn test_static_and_dynamic_lookup() {
    let router = verb_zoo();
    assert_route(&router, Method::GET, "/", "root");
    assert_route(&router, Method::GET, "/zoo/animals", "list_animals");
    assert_route(&router, Method::POST, "/zoo/animals", "create_animal");
    assert_route(&router, Method::GET, "/zoo/animals/7", "get_animal");
    assert_route(&router, Method::DELETE, "/zoo/animals/7", "delete_animal");
    assert_route(&router, Method::PUT, "/zoo/animals", "<none>");
    assert_route(&router, Method::GET, "/zoo/plants", "<none>");
}

#[test]
fn test_param_extraction() {
    let mut router: Router<Ctx> = Router::new();
    router.get("/users/:id/posts/:post_id", handler()).unwrap();

    let found = router
        .find(&Method::GET, "/users/42/posts/7")
        .expect("no match");
    assert_eq!(found.get_param("id"), Some("42"));
    assert_eq!(found.get_param("post_id"), Some("7"));
    assert_eq!(found.get_param("missing"), None);

    assert!(router.find(&Method::GET, "/users/42").is_none());
}

#[test]
fn test_wildcard_captures_rest_of_path() {
    let mut router: Router<Ctx> = Router::new();
    router.get("/files/*", handler()).unwrap();

    let found = router
        .find(&Method::GET, "/files/a/b/c.txt")
        .expect("no match");
    assert_eq!(found.get_param("*"), Some("a/b/c.txt"));
}

#[test]
fn test_head_satisfied_by_get_but_not_reverse() {
    let router = verb_zoo();
    // GET-capable route answers HEAD.
    assert_route(&router, Method::HEAD, "/zoo/animals", "list_animals");
    // HEAD-only route does not answer GET.
    assert_route(&router, Method::GET, "/zoo/health", "<none>");
    assert_route(&router, Method::HEAD, "/zoo/health", "health_check");
}

#[test]
fn test_trailing_slash_normalization() {
    let mut router: Router<Ctx> = Router::new();
    router.get("/items/:id", handler()).unwrap();

    assert!(router.find(&Method::GET, "/items/1").is_some());
    // Exactly one trailing slash is stripped...
    assert!(router.find(&Method::GET, "/items/1/").is_some());
    // ...a double slash is deliberately not normalized.
    assert!(router.find(&Method::GET, "/items/1//").is_none());
}

#[test]
fn test_first_match_wins_for_overlapping_dynamic_patterns() {
    let mut router: Router<Ctx> = Router::new();
    router
        .get("/posts/:slug", handler())
        .unwrap()
        .set_name("by_slug");
    router
        .get("/posts/:id", handler())
        .unwrap()
        .set_name("by_id");

    assert_route(&router, Method::GET, "/posts/hello", "by_slug");
}

#[test]
fn test_router_prefix_applies_to_registrations() {
    let mut router: Router<Ctx> = Router::with_prefix("/api").unwrap();
    router.get("/users", handler()).unwrap();
    router.get("/", handler()).unwrap().set_name("api_root");

    assert!(router.find(&Method::GET, "/api/users").is_some());
    assert!(router.find(&Method::GET, "/users").is_none());
    // Prefix + "/" collapses to the bare prefix.
    assert_route(&router, Method::GET, "/api", "api_root");
}

#[test]
fn test_registration_rejects_malformed_paths() {
    let mut router: Router<Ctx> = Router::new();
    assert!(matches!(
        router.get("users", handler()),
        Err(RouteError::Pattern(_))
    ));
    assert!(matches!(
        router.get("/users/", handler()),
        Err(RouteError::Pattern(_))
    ));
}

#[test]
fn test_sealed_router_rejects_mutation() {
    let mut router: Router<Ctx> = Router::new();
    router.get("/a", handler()).unwrap();

    // Any find, even a miss, ends the build phase.
    assert!(router.find(&Method::GET, "/missing").is_none());

    assert!(matches!(
        router.get("/b", handler()),
        Err(RouteError::Sealed)
    ));
    assert!(matches!(
        router.use_middleware(handler()),
        Err(RouteError::Sealed)
    ));
    let other: Router<Ctx> = Router::new();
    assert!(matches!(router.mount(&other), Err(RouteError::Sealed)));
}

#[test]
fn test_scope_registers_under_combined_prefix() {
    let mut router: Router<Ctx> = Router::with_prefix("/api").unwrap();
    {
        let mut admin = router.scope("/admin").unwrap();
        admin.get("/settings", handler()).unwrap();
        let mut audit = admin.scope("/audit").unwrap();
        audit.get("/log", handler()).unwrap();
    }

    assert!(router.find(&Method::GET, "/api/admin/settings").is_some());
    assert!(router.find(&Method::GET, "/api/admin/audit/log").is_some());
    assert!(router.find(&Method::GET, "/admin/settings").is_none());
}

#[test]
fn test_scope_rejects_malformed_paths() {
    // The same path rules as direct registration apply inside a scope; the
    // prefix join must not make a bad path accidentally valid.
    let mut router: Router<Ctx> = Router::new();
    let mut admin = router.scope("/admin").unwrap();

    assert!(matches!(
        admin.get("settings", handler()),
        Err(RouteError::Pattern(_))
    ));
    assert!(matches!(
        admin.get("/settings/", handler()),
        Err(RouteError::Pattern(_))
    ));
    drop(admin);

    // Neither "/adminsettings" nor anything else was registered.
    assert!(router.is_empty());
}

#[test]
fn test_scope_method_shorthands() {
    let mut router: Router<Ctx> = Router::new();
    {
        let mut api = router.scope("/api").unwrap();
        api.patch("/items/:id", handler()).unwrap();
        api.head("/ping", handler()).unwrap();
        api.options("/items", handler()).unwrap();
        api.any("/proxy", handler()).unwrap();
    }

    assert!(router.find(&Method::PATCH, "/api/items/1").is_some());
    assert!(router.find(&Method::HEAD, "/api/ping").is_some());
    assert!(router.find(&Method::OPTIONS, "/api/items").is_some());
    assert!(router.find(&Method::DELETE, "/api/proxy").is_some());
}
