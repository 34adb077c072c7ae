//! Integration tests for connection, navigation and pagination
//!
//! Every test drives a client through the scripted `MockTransport`.

mod helpers;

use bcc_connector::auth::{PAT_KEY, SSO_TOKEN_KEY};
use bcc_connector::transport::Method;
use bcc_connector::{Client, ConnectorConfig, Error, Pagination};
use helpers::*;
use serde_json::json;

fn variable_page(ids: &[i64]) -> serde_json::Value {
    let items: Vec<_> = ids
        .iter()
        .map(|id| json!({"bcId": id, "standard": format!("var{}", id), "type": "NUMERIC"}))
        .collect();
    json!({ "items": items })
}

/// Client plus the `mb1` memory base description
fn connect_mb() -> (std::sync::Arc<Client>, MockTransport) {
    let (client, transport) = connect();
    transport.get(&mb_url("1/extended"), json!({"bcId": 1, "name": "mb1", "referenceDate": "101"}));
    (client, transport)
}

// ============================================================================
// Connection
// ============================================================================

#[test]
fn test_connect_lists_cubes() {
    let transport = MockTransport::new();
    transport.get(USER_ME, access_list(&["demo", "other"]));
    let client = Client::connect_with_transport(test_config(), Box::new(transport.clone())).unwrap();

    let names: Vec<_> = client
        .braincube_list(None)
        .unwrap()
        .iter()
        .map(|c| c.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["demo", "other"]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.contains(&(PAT_KEY.to_string(), "abcd".to_string())));

    let other = client.braincube("other").unwrap();
    assert_eq!(other.product_id().as_deref(), Some("2"));
    assert_eq!(other.uuid(), other.product_id());
    assert_eq!(other.path(), "braincube/other");
}

#[test]
fn test_unknown_cube() {
    let (client, _) = connect();
    assert!(matches!(client.braincube("nope"), Err(Error::UnknownCube(name)) if name == "nope"));
    assert!(client.braincube_list(Some(&["demo", "nope"][..])).is_err());
}

#[test]
fn test_oauth2_session_header() {
    let transport = MockTransport::new();
    transport
        .get(&format!("{}/sso-server/ws/oauth2/session", SSO), json!({"token": "session"}))
        .get(USER_ME, access_list(&["demo"]));
    let config = ConnectorConfig {
        domain: Some("test.com".to_string()),
        oauth2_token: Some("oauth".to_string()),
        ..ConnectorConfig::default()
    };
    let client = Client::connect_with_transport(config, Box::new(transport.clone())).unwrap();
    transport.clear_log();

    transport.get(&mb_url("1/extended"), json!({"bcId": 1, "name": "mb1"}));
    client.braincube("demo").unwrap().memory_base(1).unwrap();

    let request = &transport.requests()[0];
    assert!(request.headers.contains(&(SSO_TOKEN_KEY.to_string(), "session".to_string())));
    assert!(request.headers.contains(&("Accept".to_string(), "application/json".to_string())));
}

#[test]
fn test_connect_rejects_both_auth_methods() {
    let config = ConnectorConfig {
        oauth2_token: Some("oauth".to_string()),
        ..test_config()
    };
    let result = Client::connect_with_transport(config, Box::new(MockTransport::new()));
    assert!(matches!(result, Err(Error::AmbiguousAuthentication)));
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_memory_base_paths() {
    let (client, transport) = connect_mb();
    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();

    assert_eq!(transport.api_urls(), vec![mb_url("1/extended")]);
    assert_eq!(mb.path(), "braincube/demo/{webservice}/mb/1");
    assert_eq!(mb.braincube_path(), "braincube/demo/");
    assert_eq!(mb.long_id(), "mb1");
    assert_eq!(mb.braincube_name(), "demo");
}

#[test]
fn test_tenant_placeholder_in_base_url() {
    let config = ConnectorConfig {
        braincube_base_url: Some("https://{braincube-name}.api.test.com".to_string()),
        ..test_config()
    };
    let (client, transport) = connect_with(config);
    assert!(client.has_placeholder_in_braincube_url());
    transport.get("https://demo.api.test.com/braincube/mb/3/extended", json!({"bcId": 3, "name": "mb3"}));

    let cube = client.braincube("demo").unwrap();
    assert_eq!(cube.path(), "");
    let mb = cube.memory_base(3).unwrap();
    assert_eq!(mb.path(), "{webservice}/mb/3");
    assert_eq!(mb.display_name(), "mb3");
}

#[test]
fn test_child_inherits_context() {
    let (client, transport) = connect_mb();
    transport.get(&mb_url("1/variables/7/extended"), json!({"bcId": 7, "standard": "speed"}));

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    let variable = mb.variable(7).unwrap();

    assert_eq!(variable.path(), "braincube/demo/{webservice}/mb/1/variables/7");
    assert_eq!(variable.braincube_name(), "demo");
    assert_eq!(variable.long_id().unwrap(), "mb1/d7");
    assert_eq!(variable.memory_base().unwrap().id(), mb.id());
}

#[test]
fn test_dropped_parent() {
    let (client, transport) = connect_mb();
    transport.get(&mb_url("1/variables/7/extended"), json!({"bcId": 7, "standard": "speed"}));

    let variable = client.braincube("demo").unwrap().memory_base(1).unwrap().variable(7).unwrap();
    assert!(variable.parent().is_none());
    assert!(matches!(variable.long_id(), Err(Error::ParentDropped)));
}

// ============================================================================
// Pagination
// ============================================================================

fn script_variable_pages(transport: &MockTransport) {
    transport
        .get(&mb_url("1/variables/summary?offset=0&size=2"), variable_page(&[1, 2]))
        .get(&mb_url("1/variables/summary?offset=2&size=2"), variable_page(&[3, 4]))
        .get(&mb_url("1/variables/summary?offset=4&size=2"), variable_page(&[]))
        .get(&mb_url("1/variables/summary?offset=0&size=3"), variable_page(&[1, 2, 3]));
}

#[test]
fn test_fetch_all_pages() {
    let (client, transport) = connect_mb();
    script_variable_pages(&transport);
    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    transport.clear_log();

    let variables = mb.variable_list(Pagination::all().with_page_size(2)).unwrap();

    let ids: Vec<_> = variables.iter().map(|v| v.id().to_string()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(
        transport.api_urls(),
        vec![
            mb_url("1/variables/summary?offset=0&size=2"),
            mb_url("1/variables/summary?offset=2&size=2"),
            mb_url("1/variables/summary?offset=4&size=2"),
        ]
    );
    assert_eq!(variables[2].path(), "braincube/demo/{webservice}/mb/1/variables/3");
}

#[test]
fn test_fetch_first_page() {
    let (client, transport) = connect_mb();
    script_variable_pages(&transport);
    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    transport.clear_log();

    let variables = mb.variable_list(Pagination::page(0).with_page_size(3)).unwrap();
    assert_eq!(variables.len(), 3);
    assert_eq!(transport.api_urls(), vec![mb_url("1/variables/summary?offset=0&size=3")]);
}

#[test]
fn test_fetch_second_page() {
    let (client, transport) = connect_mb();
    script_variable_pages(&transport);
    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    transport.clear_log();

    let variables = mb.variable_list(Pagination::page(1).with_page_size(2)).unwrap();
    let names: Vec<_> = variables.iter().map(|v| v.display_name().to_string()).collect();
    assert_eq!(names, vec!["var3", "var4"]);
    assert_eq!(transport.api_urls(), vec![mb_url("1/variables/summary?offset=2&size=2")]);
}

#[test]
fn test_default_page_size() {
    let (client, transport) = connect();
    transport
        .get(
            &format!("{}/braincube/demo/braincube/mb/all/summary?offset=0&size=150", API),
            json!({"items": [{"bcId": 1, "name": "mb1"}, {"bcId": 2, "name": "mb2"}]}),
        )
        .get(
            &format!("{}/braincube/demo/braincube/mb/all/summary?offset=150&size=150", API),
            json!({"items": []}),
        );

    let memory_bases = client.braincube("demo").unwrap().memory_base_list(Pagination::all()).unwrap();
    assert_eq!(memory_bases.len(), 2);
    assert_eq!(memory_bases[1].path(), "braincube/demo/{webservice}/mb/2");
    assert_eq!(transport.api_urls().len(), 2);
}

#[test]
fn test_page_size_parameter() {
    let mut config = test_config();
    config.parameters.insert("page_size".to_string(), json!(2));
    let (client, transport) = connect_with(config);
    transport.get(&mb_url("1/extended"), json!({"bcId": 1, "name": "mb1"}));
    script_variable_pages(&transport);

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    assert_eq!(mb.variable_list(Pagination::all()).unwrap().len(), 4);
}

#[test]
fn test_zero_page_size_is_rejected() {
    let (client, transport) = connect();
    transport.get(
        &format!("{}/braincube/demo/braincube/mb/all/summary?offset=0&size=0", API),
        json!({"items": [{"bcId": 1, "name": "mb1"}]}),
    );
    let cube = client.braincube("demo").unwrap();

    let all = cube.memory_base_list(Pagination::all().with_page_size(0));
    assert!(matches!(all, Err(Error::InvalidParameter(_))));
    let one = cube.memory_base_list(Pagination::page(1).with_page_size(0));
    assert!(matches!(one, Err(Error::InvalidParameter(_))));
    assert!(transport.api_urls().is_empty());
}

#[test]
fn test_page_offset_overflow_is_rejected() {
    let (client, transport) = connect();
    let cube = client.braincube("demo").unwrap();

    let result = cube.memory_base_list(Pagination::page(usize::MAX).with_page_size(2));
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
    assert!(transport.api_urls().is_empty());
}

#[test]
fn test_rules_use_selector() {
    let (client, transport) = connect_mb();
    transport
        .get(&mb_url("1/rules/all/selector?offset=0&size=150"), json!({"items": [{"bcId": 4, "name": "r"}]}))
        .get(&mb_url("1/rules/all/selector?offset=150&size=150"), json!({"items": []}))
        .get(&mb_url("1/rules/4/summary"), json!({"bcId": 4, "name": "r"}));

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    assert_eq!(mb.rule_list(Pagination::all()).unwrap().len(), 1);
    assert_eq!(mb.rule(4).unwrap().display_name(), "r");
}

#[test]
fn test_job_rules_are_listed_under_the_job() {
    let (client, transport) = connect_mb();
    transport
        .get(&mb_url("1/jobs/5/extended"), json!({"bcId": 5, "name": "job"}))
        .get(
            &mb_url("1/jobs/5/rules/all/summary?offset=0&size=150"),
            json!({"items": [{"bcId": 4, "name": "r4"}, {"bcId": 6, "name": "r6"}]}),
        )
        .get(&mb_url("1/jobs/5/rules/all/summary?offset=150&size=150"), json!({"items": []}));

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    let job = mb.job(5).unwrap();
    transport.clear_log();

    let rules = job.rule_list(Pagination::all()).unwrap();
    assert_eq!(
        transport.api_urls(),
        vec![
            mb_url("1/jobs/5/rules/all/summary?offset=0&size=150"),
            mb_url("1/jobs/5/rules/all/summary?offset=150&size=150"),
        ]
    );

    let names: Vec<_> = rules.iter().map(|r| r.display_name().to_string()).collect();
    assert_eq!(names, vec!["r4", "r6"]);
    assert_eq!(rules[0].path(), "braincube/demo/{webservice}/mb/1/jobs/5/rules/4");
    for rule in &rules {
        let owner = rule.memory_base().unwrap();
        assert_eq!(owner.long_id(), "mb1");
    }
}

#[test]
fn test_datagroup_variable_list() {
    let (client, transport) = connect_mb();
    transport
        .get(
            &mb_url("1/dataGroups/9/extended"),
            json!({"bcId": 9, "name": "group", "variables": [{"bcId": 4}, {"bcId": 2}]}),
        )
        .get(&mb_url("1/variables/2/extended"), json!({"bcId": 2, "standard": "v2", "type": "NUMERIC"}))
        .get(&mb_url("1/variables/4/extended"), json!({"bcId": 4, "standard": "v4", "type": "DISCRETE"}));

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    let group = mb.datagroup(9).unwrap();
    transport.clear_log();

    let variables = group.variable_list().unwrap();
    assert_eq!(
        transport.api_urls(),
        vec![mb_url("1/variables/4/extended"), mb_url("1/variables/2/extended")]
    );
    let names: Vec<_> = variables.iter().map(|v| v.display_name().to_string()).collect();
    assert_eq!(names, vec!["v4", "v2"]);
    assert_eq!(variables[0].long_id().unwrap(), "mb1/d4");
}

// ============================================================================
// Entity construction
// ============================================================================

#[test]
fn test_get_name_follows_parameters() {
    let (client, transport) = connect_mb();
    transport.get(
        &mb_url("1/variables/7/extended"),
        json!({"bcId": 7, "standard": "speed", "tag": "S-7", "name": "raw"}),
    );
    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    let variable = mb.variable(7).unwrap();
    assert_eq!(variable.get_name().unwrap(), "speed");

    client.params().set_parameter("VariableDescription_name_key", "tag").unwrap();
    assert_eq!(variable.get_name().unwrap(), "S-7");
    assert_eq!(variable.display_name(), "speed");
    assert_eq!(mb.get_name().unwrap(), "mb1");

    client.params().set_parameter("BaseEntity_name_key", "bcId").unwrap();
    assert_eq!(mb.get_name().unwrap(), "1");
}

#[test]
fn test_missing_id_field() {
    let (client, transport) = connect_mb();
    transport.get(&mb_url("1/events/3/extended"), json!({"name": "no id"}));

    let mb = client.braincube("demo").unwrap().memory_base(1).unwrap();
    match mb.event(3) {
        Err(Error::MissingField { entity, field }) => {
            assert_eq!(entity, "Event");
            assert_eq!(field, "bcId");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_error_status_is_surfaced() {
    let (client, transport) = connect();
    transport.respond(Method::Get, &mb_url("2/extended"), 403, json!({"error": "denied"}));

    match client.braincube("demo").unwrap().memory_base(2) {
        Err(Error::RequestFailed { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("denied"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_body() {
    let (client, transport) = connect();
    transport.respond_text(Method::Get, &mb_url("2/extended"), 200, "<html>oops</html>");

    match client.braincube("demo").unwrap().memory_base(2) {
        Err(Error::MalformedResponse { body_excerpt }) => assert_eq!(body_excerpt, "<html>oops</html>"),
        other => panic!("unexpected result: {other:?}"),
    }
}
