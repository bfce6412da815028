//! Mocked bridge responses as the frontend sees them

use aot_e2e::bridge::{CHOOSE_FILE, FIT_NOW, GET_SETTINGS, QUICK_LOOK, SET_SETTINGS};
use aot_e2e::{BridgeMock, FileProvider, MockResponse, Settings};
use serde_json::{json, Value};

fn mock() -> BridgeMock {
    BridgeMock::from_provider(&FileProvider::fixed("/tmp/icon.png"))
}

#[test]
fn settings_write_keeps_fit_window_when_omitted() {
    let mut bridge = mock().with_settings(Settings {
        aspect_lock: false,
        fit_window: true,
    });

    let result = bridge
        .invoke(SET_SETTINGS, &json!({ "update": { "aspect_lock": true } }))
        .unwrap();

    assert_eq!(result, json!({ "aspect_lock": true, "fit_window": true }));
}

#[test]
fn absent_fit_window_is_true_regardless_of_prior_value() {
    let mut bridge = mock().with_settings(Settings {
        aspect_lock: false,
        fit_window: false,
    });

    let result = bridge
        .invoke(SET_SETTINGS, &json!({ "update": { "aspect_lock": false } }))
        .unwrap();

    assert_eq!(result, json!({ "aspect_lock": false, "fit_window": true }));
}

#[test]
fn absent_aspect_lock_keeps_prior_value() {
    let mut bridge = mock().with_settings(Settings {
        aspect_lock: true,
        fit_window: true,
    });

    let result = bridge
        .invoke(SET_SETTINGS, &json!({ "update": { "fit_window": false } }))
        .unwrap();

    assert_eq!(result, json!({ "aspect_lock": true, "fit_window": false }));
}

#[test]
fn settings_write_is_visible_to_later_reads() {
    let mut bridge = mock();
    bridge
        .invoke(SET_SETTINGS, &json!({ "update": { "aspect_lock": true } }))
        .unwrap();

    assert_eq!(
        bridge.invoke(GET_SETTINGS, &Value::Null).unwrap(),
        json!({ "aspect_lock": true, "fit_window": true })
    );
}

#[test]
fn unknown_command_resolves_empty() {
    let mut bridge = mock();
    assert_eq!(
        bridge.invoke("reset_cache", &json!({ "anything": 1 })).unwrap(),
        Value::Null
    );
    assert_eq!(bridge.invoke("", &Value::Null).unwrap(), Value::Null);
}

#[test]
fn default_table_answers_known_commands() {
    let mut bridge = mock();
    assert_eq!(
        bridge.invoke(CHOOSE_FILE, &json!({})).unwrap(),
        json!("/tmp/icon.png")
    );
    assert_eq!(bridge.invoke(FIT_NOW, &json!({})).unwrap(), Value::Null);
    assert_eq!(bridge.invoke(QUICK_LOOK, &json!({})).unwrap(), Value::Null);
}

#[test]
fn commands_can_be_overridden_per_scenario() {
    let mut bridge = mock().with_command(
        CHOOSE_FILE,
        MockResponse::Value {
            value: json!("/fixtures/other.jpg"),
        },
    );
    assert_eq!(
        bridge.invoke(CHOOSE_FILE, &json!({})).unwrap(),
        json!("/fixtures/other.jpg")
    );
}

#[test]
fn dialog_provider_selects_nothing() {
    let mut bridge = BridgeMock::from_provider(&FileProvider::Dialog);
    assert_eq!(bridge.invoke(CHOOSE_FILE, &json!({})).unwrap(), Value::Null);
}

#[test]
fn init_script_matches_in_process_table() {
    let bridge = mock();
    let script = bridge.init_script();
    for command in [CHOOSE_FILE, FIT_NOW, QUICK_LOOK, GET_SETTINGS, SET_SETTINGS] {
        assert!(script.contains(&format!("\"{}\"", command)), "{} missing", command);
    }
    assert!(script.contains(r#"let settings = {"aspect_lock":false,"fit_window":true};"#));
    assert!(bridge.response_for("reset_cache").is_none());
    assert_eq!(
        bridge.response_for(CHOOSE_FILE),
        Some(&MockResponse::FixturePath)
    );
}
