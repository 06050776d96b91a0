use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{ClientOptions, InventoryClient};
use crate::controller::{Action, Controller, DELETED_MESSAGE, DELETE_FAILED_MESSAGE};
use crate::form::{Field, FormFields, FormState};
use crate::query::SearchFilters;

fn client_for(server: &MockServer) -> InventoryClient {
    InventoryClient::new(&ClientOptions {
        base_url: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .unwrap()
}

fn controller_with(fields: FormFields) -> Controller {
    Controller::new(
        FormState {
            fields,
            ..Default::default()
        },
        SearchFilters::default(),
    )
}

fn bolt_json() -> serde_json::Value {
    json!({
        "id": 42,
        "name": "bolt",
        "quantity": 10,
        "restock_level": 5,
        "restock_count": 2,
        "condition": "NEW",
        "first_entry_date": "2023-01-02",
        "last_restock_date": "2023-03-04"
    })
}

async fn run(client: &InventoryClient, controller: &mut Controller, action: Action) {
    let ticket = controller.dispatch(action);
    let request = ticket.request.clone().unwrap();
    let outcome = client.execute(&request).await;
    controller.complete(&ticket, &outcome);
}

#[tokio::test]
async fn create_posts_payload_with_null_condition() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inventory"))
        .and(body_json(json!({
            "id": "",
            "name": "bolt",
            "quantity": 10,
            "restock_level": 5,
            "restock_count": 2,
            "condition": null,
            "first_entry_date": "",
            "last_restock_date": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(bolt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        name: "bolt".to_string(),
        quantity: "10".to_string(),
        restock_level: "5".to_string(),
        restock_count: "2".to_string(),
        condition: "unknown".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Create).await;

    let state = controller.state();
    assert_eq!(state.flash.as_deref(), Some("Success"));
    assert_eq!(state.fields.id, "42");
    assert_eq!(state.fields.condition, "NEW");
    assert_eq!(state.fields.last_restock_date, "2023-03-04");
}

#[tokio::test]
async fn update_puts_to_record_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/inventory/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bolt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "42".to_string(),
        name: "bolt".to_string(),
        condition: "USED".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Update).await;
    assert_eq!(controller.state().flash.as_deref(), Some("Success"));
    assert_eq!(controller.state().fields.quantity, "10");
}

#[tokio::test]
async fn restock_sends_no_body() {
    let server = MockServer::start().await;
    let mut restocked = bolt_json();
    restocked["quantity"] = json!(12);
    Mock::given(method("PUT"))
        .and(path("/inventory/42/restock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(restocked))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: " 42 ".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Restock).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
    assert_eq!(controller.state().fields.quantity, "12");
}

#[tokio::test]
async fn update_trims_padded_id_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/inventory/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bolt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: " 42 ".to_string(),
        name: "bolt".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Update).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.path(), "/inventory/42");
    assert_eq!(controller.state().flash.as_deref(), Some("Success"));
}

#[tokio::test]
async fn retrieve_copies_loosely_shaped_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "name": "spring",
            "quantity": "10",
            "first_entry_date": "2023-01-02T08:30:00Z"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "8".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Retrieve).await;

    let state = controller.state();
    assert_eq!(state.flash.as_deref(), Some("Success"));
    assert_eq!(state.fields.quantity, "10");
    assert_eq!(state.fields.first_entry_date, "2023-01-02T08:30:00Z");
}

#[tokio::test]
async fn retrieve_fills_missing_attributes_with_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "nut"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "7".to_string(),
        quantity: "99".to_string(),
        condition: "USED".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Retrieve).await;

    let fields = &controller.state().fields;
    assert_eq!(fields.name, "nut");
    assert_eq!(fields.quantity, "");
    assert_eq!(fields.condition, "UNKNOWN");
}

#[tokio::test]
async fn retrieve_failure_keeps_id_and_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": 404, "message": "Product 9 was not found"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "9".to_string(),
        name: "stale".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Retrieve).await;

    let state = controller.state();
    assert_eq!(state.fields.id, "9");
    assert_eq!(state.fields.name, "");
    assert_eq!(state.flash.as_deref(), Some("Product 9 was not found"));
}

#[tokio::test]
async fn malformed_error_body_falls_back_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/inventory/3"))
        .respond_with(ResponseTemplate::new(400).set_body_string("<html>bad</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "3".to_string(),
        name: "washer".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Update).await;
    assert_eq!(
        controller.state().flash.as_deref(),
        Some("Request failed with status 400")
    );
    assert_eq!(controller.state().fields.name, "washer");
}

#[tokio::test]
async fn delete_success_and_failure_use_fixed_messages() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/inventory/5"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/inventory/6"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "5".to_string(),
        name: "gone".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Delete).await;
    assert_eq!(controller.state().flash.as_deref(), Some(DELETED_MESSAGE));
    assert_eq!(controller.state().fields.id, "5");
    assert_eq!(controller.state().fields.name, "");

    controller.set_field(Field::Id, "6");
    controller.set_field(Field::Name, "kept");
    run(&client, &mut controller, Action::Delete).await;
    assert_eq!(controller.state().flash.as_deref(), Some(DELETE_FAILED_MESSAGE));
    assert_eq!(controller.state().fields.name, "kept");
}

#[tokio::test]
async fn search_sends_filters_and_fills_table() {
    let server = MockServer::start().await;
    let mut second = bolt_json();
    second["id"] = json!(43);
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .and(query_param("id", "42"))
        .and(query_param("name", "bolt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bolt_json(), second])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        id: "42".to_string(),
        name: "bolt".to_string(),
        restock_level: "5".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Search).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("id=42&name=bolt"));

    let state = controller.state();
    assert_eq!(state.results.as_ref().map(Vec::len), Some(2));
    assert_eq!(state.fields.quantity, "10");
    assert_eq!(state.flash.as_deref(), Some("Success"));
}

#[tokio::test]
async fn empty_search_has_no_query_and_empty_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = controller_with(FormFields {
        restock_count: "3".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Search).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), None);
    assert_eq!(controller.state().results, Some(Vec::new()));
    assert_eq!(controller.state().fields.restock_count, "3");
}

#[tokio::test]
async fn unreachable_service_reports_transport_failure() {
    let client = InventoryClient::new(&ClientOptions {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    })
    .unwrap();
    let mut controller = controller_with(FormFields {
        id: "1".to_string(),
        ..FormFields::default()
    });
    run(&client, &mut controller, Action::Update).await;
    let flash = controller.state().flash.clone().unwrap();
    assert!(flash.starts_with("Unable to reach inventory service"));
}

#[tokio::test]
async fn health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.health().await.unwrap(), "OK");
}

#[tokio::test]
async fn shell_session_runs_script_against_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bolt_json()))
        .mount(&server)
        .await;

    let script: &[u8] = b"set id 42\nretrieve\n";
    let client = client_for(&server);
    let controller = Controller::new(FormState::default(), SearchFilters::default());
    let state = crate::shell::run_session(script, client, controller, false)
        .await
        .unwrap();

    assert_eq!(state.fields.name, "bolt");
    assert_eq!(state.flash.as_deref(), Some("Success"));
}

#[tokio::test]
async fn shell_clear_keeps_results_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bolt_json()])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut controller = Controller::new(FormState::default(), SearchFilters::default());
    run(&client, &mut controller, Action::Search).await;

    let script: &[u8] = b"clear\n";
    let state = crate::shell::run_session(script, client, controller, false)
        .await
        .unwrap();
    assert_eq!(state.fields, FormFields::default());
    assert!(state.flash.is_none());
    assert_eq!(state.results.as_ref().map(Vec::len), Some(1));
}
