//! End-to-end pipeline tests: preflight short-circuit, authorization,
//! credential relay, path transformation, and error pass-through.

use reqwest::Method;
use serde_json::json;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use edge_gateway::config::{
    AccessConfig, AuthorizationRuleConfig, FilterConfig, GatewayConfig, IssuerConfig, RouteConfig,
};

mod common;
use common::{start_gateway, start_jwks_issuer, start_recording_upstream};

const SECRET: &[u8] = b"integration-test-secret";
const KID: &str = "it-key";

fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.observability.metrics_enabled = false;
    config
}

fn route(id: &str, paths: &[&str], filters: Vec<FilterConfig>, upstream: SocketAddr) -> RouteConfig {
    RouteConfig {
        id: id.to_string(),
        method: None,
        paths: paths.iter().map(|p| p.to_string()).collect(),
        filters,
        upstream: format!("http://{}", upstream),
    }
}

fn rule(method: Option<&str>, path: &str, access: AccessConfig) -> AuthorizationRuleConfig {
    AuthorizationRuleConfig {
        method: method.map(str::to_string),
        path: path.to_string(),
        access,
    }
}

fn test_jwks() -> serde_json::Value {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    json!({
        "keys": [{
            "kty": "oct",
            "kid": KID,
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(SECRET),
        }]
    })
}

fn mint_token(issuer: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let header = jsonwebtoken::Header {
        kid: Some(KID.to_string()),
        ..jsonwebtoken::Header::default()
    };
    jsonwebtoken::encode(
        &header,
        &json!({ "iss": issuer, "sub": "user-1", "exp": now + 3600 }),
        &jsonwebtoken::EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_preflight_short_circuits_before_any_other_stage() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;

    let mut config = base_config();
    config.routes = vec![route("carrito", &["/api/carrito/**"], vec![], upstream)];
    config.authorization.rules = vec![rule(None, "/api/carrito/**", AccessConfig::Authenticated)];
    let gateway = start_gateway(config).await;

    let response = client()
        .request(Method::OPTIONS, format!("http://{}/api/carrito/items", gateway))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert!(headers.contains_key("access-control-allow-methods"));
    assert!(headers.contains_key("access-control-allow-headers"));
    assert_eq!(headers.get("access-control-max-age").unwrap(), "3600");

    // Protected path, no credential: only the short circuit explains 200
    // and an untouched upstream.
    assert!(recording.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_public_get_strips_prefix_and_keeps_query() {
    let (upstream, recording) = start_recording_upstream(200, r#"{"content":[]}"#).await;

    let mut config = base_config();
    config.routes = vec![route(
        "catalogo",
        &["/api/peliculas/**"],
        vec![FilterConfig::StripPrefix { parts: 1 }],
        upstream,
    )];
    let gateway = start_gateway(config).await;

    let response = client()
        .get(format!("http://{}/api/peliculas?page=0&size=12", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("access-control-allow-origin"));
    assert_eq!(response.text().await.unwrap(), r#"{"content":[]}"#);

    let seen = recording.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].target, "/peliculas?page=0&size=12");
}

#[tokio::test]
async fn test_inbound_authorization_on_public_path_is_forwarded_verbatim() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;

    let mut config = base_config();
    config.routes = vec![route("catalogo", &["/api/peliculas/**"], vec![], upstream)];
    let gateway = start_gateway(config).await;

    client()
        .get(format!("http://{}/api/peliculas", gateway))
        .header("Authorization", "Bearer opaque-client-token")
        .send()
        .await
        .unwrap();

    let seen = recording.lock().unwrap();
    assert_eq!(seen[0].header("authorization"), Some("Bearer opaque-client-token"));
}

#[tokio::test]
async fn test_protected_path_without_credential_never_reaches_upstream() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;

    let mut config = base_config();
    config.routes = vec![route("carrito", &["/api/carrito/**"], vec![], upstream)];
    config.authorization.rules = vec![rule(None, "/api/carrito/**", AccessConfig::Authenticated)];
    let gateway = start_gateway(config).await;

    let response = client()
        .post(format!("http://{}/api/carrito/items", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    // 401 is an in-pipeline error and still carries the CORS headers.
    assert!(response.headers().contains_key("access-control-allow-origin"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "unauthorized" }));

    assert!(recording.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_credential_is_relayed_unchanged() {
    let (upstream, recording) = start_recording_upstream(201, "{}").await;
    let issuer_addr = start_jwks_issuer(test_jwks()).await;
    let issuer = "http://issuer-a.test/realms/videoclub";

    let mut config = base_config();
    config.routes = vec![route("carrito", &["/api/carrito/**"], vec![], upstream)];
    config.authorization.rules = vec![rule(None, "/api/carrito/**", AccessConfig::Authenticated)];
    config.auth.issuers = vec![IssuerConfig {
        issuer: issuer.to_string(),
        jwks_url: format!("http://{}/certs", issuer_addr),
    }];
    let gateway = start_gateway(config).await;

    let token = mint_token(issuer);
    let response = client()
        .post(format!("http://{}/api/carrito/items", gateway))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let seen = recording.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].header("authorization"),
        Some(format!("Bearer {}", token).as_str())
    );
}

#[tokio::test]
async fn test_multi_issuer_trust_accepts_both_and_rejects_others() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;
    let issuer_addr = start_jwks_issuer(test_jwks()).await;
    let issuer_a = "http://issuer-a.test/realms/videoclub";
    let issuer_b = "http://issuer-b.test/realms/videoclub";

    let mut config = base_config();
    config.routes = vec![route("carrito", &["/api/carrito/**"], vec![], upstream)];
    config.authorization.rules = vec![rule(None, "/api/carrito/**", AccessConfig::Authenticated)];
    config.auth.issuers = vec![
        IssuerConfig {
            issuer: issuer_a.to_string(),
            jwks_url: format!("http://{}/certs", issuer_addr),
        },
        IssuerConfig {
            issuer: issuer_b.to_string(),
            jwks_url: format!("http://{}/certs", issuer_addr),
        },
    ];
    let gateway = start_gateway(config).await;

    for issuer in [issuer_a, issuer_b] {
        let response = client()
            .get(format!("http://{}/api/carrito/items", gateway))
            .header("Authorization", format!("Bearer {}", mint_token(issuer)))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "issuer {} must be accepted", issuer);
    }
    assert_eq!(recording.lock().unwrap().len(), 2);

    // Valid signature and timestamps, issuer outside the trusted set.
    let response = client()
        .get(format!("http://{}/api/carrito/items", gateway))
        .header(
            "Authorization",
            format!("Bearer {}", mint_token("http://evil.test/realms/videoclub")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(recording.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_error_passes_through_with_cors_headers() {
    let (upstream, _recording) =
        start_recording_upstream(400, r#"{"error":"pelicula invalida"}"#).await;

    let mut config = base_config();
    config.routes = vec![route("catalogo", &["/api/peliculas/**"], vec![], upstream)];
    let gateway = start_gateway(config).await;

    let response = client()
        .get(format!("http://{}/api/peliculas/999", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert!(response.headers().contains_key("access-control-allow-origin"));
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"error":"pelicula invalida"}"#
    );
}

#[tokio::test]
async fn test_unrouted_path_is_404_not_401() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;

    let mut config = base_config();
    config.routes = vec![route("catalogo", &["/api/peliculas/**"], vec![], upstream)];
    let gateway = start_gateway(config).await;

    let response = client()
        .get(format!("http://{}/api/nowhere", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert!(response.headers().contains_key("access-control-allow-origin"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "no matching route" }));
    assert!(recording.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_route_declaration_order_decides_overlapping_patterns() {
    let (upstream_a, recording_a) = start_recording_upstream(200, "a").await;
    let (upstream_b, recording_b) = start_recording_upstream(200, "b").await;

    let mut config = base_config();
    config.routes = vec![
        route("first", &["/api/shared/**"], vec![], upstream_a),
        route("second", &["/api/shared/**"], vec![], upstream_b),
    ];
    let gateway = start_gateway(config).await;

    let response = client()
        .get(format!("http://{}/api/shared/item", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), "a");
    assert_eq!(recording_a.lock().unwrap().len(), 1);
    assert!(recording_b.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_502_with_cors_headers() {
    // Bind and drop a listener so the port is reliably closed.
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let mut config = base_config();
    config.routes = vec![route("gone", &["/api/gone/**"], vec![], addr)];
    let gateway = start_gateway(config).await;

    let response = client()
        .get(format!("http://{}/api/gone", gateway))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_rewrite_route_forwards_the_rewritten_path() {
    let (upstream, recording) = start_recording_upstream(200, "{}").await;

    let mut config = base_config();
    config.routes = vec![route(
        "sso",
        &["/auth/**", "/realms/**"],
        vec![FilterConfig::RewritePath {
            pattern: "/auth/(?<segment>.*)".to_string(),
            replacement: "/${segment}".to_string(),
        }],
        upstream,
    )];
    let gateway = start_gateway(config).await;

    client()
        .get(format!("http://{}/auth/realms/videoclub/certs", gateway))
        .send()
        .await
        .unwrap();
    // The same filter on a non-matching path is a no-op.
    client()
        .get(format!("http://{}/realms/videoclub/certs", gateway))
        .send()
        .await
        .unwrap();

    let seen = recording.lock().unwrap();
    assert_eq!(seen[0].target, "/realms/videoclub/certs");
    assert_eq!(seen[1].target, "/realms/videoclub/certs");
}
