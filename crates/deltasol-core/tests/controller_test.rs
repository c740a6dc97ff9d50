#![allow(clippy::unwrap_used)]
// End-to-end tests for `Controller` against a wiremock device.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deltasol_api::DeviceClient;
use deltasol_core::{Controller, CoreError, DeviceConfig, Product, TelemetryValue};

// ── Helpers ─────────────────────────────────────────────────────────

const INFO_PATH: &str = "/cgi-bin/get_resol_device_information";

fn config() -> DeviceConfig {
    DeviceConfig {
        username: Some("admin".into()),
        password: Some("hunter2".to_string().into()),
        ..DeviceConfig::new("unused")
    }
}

fn controller(server: &MockServer, config: DeviceConfig) -> Controller {
    let base_url = Url::parse(&server.uri()).unwrap();
    Controller::with_client(config, DeviceClient::with_client(reqwest::Client::new(), base_url))
}

fn device_info(product: &str) -> String {
    format!(
        "vendor = \"RESOL\"\nproduct = \"{product}\"\nserial = \"001E3D0012AB\"\n\
         version = \"2.2.0\"\nbuild = \"201907041034\"\nname = \"Solar\"\n"
    )
}

async fn mount_detection(server: &MockServer, product: &str) {
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(device_info(product)))
        .mount(server)
        .await;
}

fn live_data() -> serde_json::Value {
    json!({
        "headers": [{
            "id": "00_0010_7E11_10_0100",
            "description": "DeltaSol MX [Regler]",
            "source_name": "DeltaSol MX [Regler]",
            "destination_name": "DFA",
            "fields": [
                { "id": "000_2_0", "name": "Temperature sensor 1", "unit": " °C" },
                { "id": "010_4_0", "name": "Heat quantity", "unit": " Wh" }
            ]
        }],
        "headersets": [{
            "packets": [{ "field_values": [
                { "raw_value": 23.456 },
                { "raw_value": 123_456 }
            ]}]
        }]
    })
}

// ── Webservice products ─────────────────────────────────────────────

#[tokio::test]
async fn test_km2_snapshot_end_to_end() {
    let server = MockServer::start().await;
    mount_detection(&server, "KM2").await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/resol-webservice"))
        .and(body_string_contains("\"login\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": "1", "result": { "authId": "abc" } }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/resol-webservice"))
        .and(body_string_contains("dataGetCurrentData"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": "1", "result": live_data() }])),
        )
        .mount(&server)
        .await;

    let ctrl = controller(&server, config());
    let snap = ctrl.fetch_snapshot().await.unwrap();

    assert_eq!(snap.device.product, Product::Km2);
    assert_eq!(snap.device.mac_address, "00:1E:3D:00:12:AB");
    assert_eq!(snap.len(), 2);

    let temp = snap.by_name("temperature_sensor_1").unwrap();
    assert_eq!(temp.unique_id, "00_0010_7E11_10_0100__000_2_0");
    assert_eq!(temp.value, TelemetryValue::Number(23.46));
    assert_eq!(temp.unit, "°C");

    let heat = snap.get("00_0010_7E11_10_0100__010_4_0").unwrap();
    assert_eq!(heat.value, TelemetryValue::Integer(123_456));

    let latest = ctrl.latest().unwrap();
    assert!(std::sync::Arc::ptr_eq(&latest, &snap));
}

#[tokio::test]
async fn test_webservice_without_credentials_fails_auth() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL2Plus").await;

    let ctrl = controller(&server, DeviceConfig::new("unused"));
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(err.is_auth(), "expected AuthenticationFailed, got: {err:?}");
    assert!(ctrl.latest().is_none());
}

// ── DLX products ────────────────────────────────────────────────────

#[tokio::test]
async fn test_dl3_snapshot_with_filter() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL3").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .and(query_param("sessionAuthUsername", "admin"))
        .and(query_param("filter", "05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_data()))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(
        &server,
        DeviceConfig {
            filter_id: Some("05".into()),
            ..config()
        },
    );
    let snap = ctrl.fetch_snapshot().await.unwrap();

    assert_eq!(snap.device.product, Product::Dl3);
    assert_eq!(snap.len(), 2);
}

#[tokio::test]
async fn test_dlx_malformed_payload() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL2").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "headers": [] })))
        .mount(&server)
        .await;

    let ctrl = controller(&server, DeviceConfig::new("unused"));
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(
        matches!(err, CoreError::MalformedResponse { .. }),
        "expected MalformedResponse, got: {err:?}"
    );
}

// ── Detection ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_detection_is_memoized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(device_info("DL3")))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(&server, config());
    let first = ctrl.detect().await.unwrap();
    let second = ctrl.detect().await.unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(ctrl.identity().unwrap().display_name, "Solar");
}

#[tokio::test]
async fn test_failed_detection_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_detection(&server, "DL3").await;

    let ctrl = controller(&server, config());
    assert!(ctrl.detect().await.is_err());
    assert_eq!(ctrl.detect().await.unwrap().product, Product::Dl3);
}

#[tokio::test]
async fn test_unknown_product_is_unsupported() {
    let server = MockServer::start().await;
    mount_detection(&server, "VBus.net").await;

    let ctrl = controller(&server, config());
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    match err {
        CoreError::UnsupportedProduct { product } => assert_eq!(product, "vbus.net"),
        other => panic!("expected UnsupportedProduct, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_detection_not_found_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ctrl = controller(&server, config());
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(
        matches!(err, CoreError::DeviceUnreachable { .. }),
        "expected DeviceUnreachable, got: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let ctrl = Controller::new(DeviceConfig {
        port: Some(1),
        request_timeout: Duration::from_secs(2),
        ..DeviceConfig::new("127.0.0.1")
    })
    .unwrap();

    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(err.is_transient(), "expected a transient error, got: {err:?}");
}

// ── Timeouts and failure semantics ──────────────────────────────────

#[tokio::test]
async fn test_cycle_timeout() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL3").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(live_data())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let ctrl = controller(
        &server,
        DeviceConfig {
            cycle_timeout: Duration::from_millis(300),
            ..config()
        },
    );
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(
        matches!(err, CoreError::Timeout { .. }),
        "expected Timeout, got: {err:?}"
    );
}

#[tokio::test]
async fn test_slow_detection_request_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(device_info("DL3"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let ctrl = Controller::new(DeviceConfig {
        port: Some(server.address().port()),
        request_timeout: Duration::from_secs(1),
        cycle_timeout: Duration::from_secs(10),
        ..DeviceConfig::new("127.0.0.1")
    })
    .unwrap();
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(
        matches!(err, CoreError::DeviceUnreachable { .. }),
        "expected DeviceUnreachable, got: {err:?}"
    );
    assert!(ctrl.identity().is_none());
}

#[tokio::test]
async fn test_failed_fetch_keeps_latest_snapshot() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL3").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_data()))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let ctrl = controller(&server, config());
    let first = ctrl.fetch_snapshot().await.unwrap();
    let err = ctrl.fetch_snapshot().await.unwrap_err();

    assert!(err.is_auth(), "expected AuthenticationFailed, got: {err:?}");
    assert!(std::sync::Arc::ptr_eq(&ctrl.latest().unwrap(), &first));
}

// ── Coordinator ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_coordinator_publishes_first_cycle_immediately() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL3").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_data()))
        .mount(&server)
        .await;

    let handle = deltasol_core::CoordinatorHandle::spawn(
        controller(&server, config()),
        Duration::from_secs(300),
    );
    let mut rx = handle.subscribe();

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();

    let state = handle.current();
    assert!(state.last_update_success);
    assert!(state.last_error.is_none());
    assert_eq!(state.snapshot.unwrap().len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_coordinator_request_refresh_runs_another_cycle() {
    let server = MockServer::start().await;
    mount_detection(&server, "DL3").await;

    Mock::given(method("GET"))
        .and(path("/dlx/download/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_data()))
        .expect(2)
        .mount(&server)
        .await;

    let handle = deltasol_core::CoordinatorHandle::spawn(
        controller(&server, config()),
        Duration::from_secs(300),
    );
    let mut rx = handle.subscribe();

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();
    let first = handle.current().snapshot.unwrap();

    handle.request_refresh();
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .unwrap()
        .unwrap();

    let second = handle.current().snapshot.unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert!(handle.current().last_update_success);

    handle.shutdown().await;
}
