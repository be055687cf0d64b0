// CLASSIFICATION: COMMUNITY
// Filename: api.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Route table of the control surface. Transport-free: takes a method,
//! path and body, returns a status code and JSON document, so every route
//! can be exercised without opening a socket.

use std::time::{Duration, Instant};

use log::{debug, error};
use serde_json::{json, Map, Value};

use crate::device::clock::{Rtc, TimeFields};
use crate::device::settings::{MasterCard, SettingsError};
use crate::device::{Device, DeviceError, FIRMWARE_VERSION, MAX_PULSE};
use crate::hw::drivers::relay::RelayPin;
use crate::registry::{codec, RegistryError};
use crate::store::ByteStore;

/// HTTP verbs the route table distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// 200 with `"status": "success"` merged into `fields`.
    pub fn success(fields: Value) -> Self {
        let mut map = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("status".into(), Value::from("success"));
        Self {
            status: 200,
            body: Value::Object(map),
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self::success(json!({ "message": text.into() }))
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "status": "error", "message": message.into() }),
        }
    }

    fn bad_request(expected: &str) -> Self {
        Self::error(400, format!("Invalid request body. Expected {expected}"))
    }
}

type Handled = Result<ApiResponse, ApiResponse>;

/// Dispatch one request against `device`.
pub fn route<S, P, C>(
    device: &mut Device<S, P, C>,
    method: Method,
    url: &str,
    body: &str,
    now: Instant,
) -> ApiResponse
where
    S: ByteStore,
    P: RelayPin,
    C: Rtc,
{
    let path = url.split('?').next().unwrap_or(url);
    debug!("api: {:?} {}", method, path);
    let handled = match (method, path) {
        (Method::Get, "/status") => status(device),
        (Method::Post, "/api/reset") => device
            .factory_reset()
            .map(|_| ApiResponse::message("reset done"))
            .map_err(internal),

        (Method::Get, "/api/op_method") => device
            .settings()
            .op_method()
            .map(|m| ApiResponse::success(json!({ "method": m })))
            .map_err(settings_error),
        (Method::Post, "/api/op_method") => set_op_method(device, body),

        (Method::Post, "/api/wifi/set_ssid") => set_ssid(device, body),
        (Method::Get, "/api/wifi/get_ssid") => device
            .settings()
            .ssid()
            .map(|ssid| ApiResponse::success(json!({ "ssid": ssid })))
            .map_err(settings_error),
        (Method::Post, "/api/wifi/set_password") => set_password(device, body),
        (Method::Get, "/api/wifi/get_password") => device
            .settings()
            .password()
            .map(|pw| ApiResponse::success(json!({ "password": pw })))
            .map_err(settings_error),
        (Method::Get, "/api/wifi/get_network_info") => network_info(device),
        (Method::Post, "/api/wifi/set_network_info") => set_network_info(device, body),

        (Method::Post, "/api/relay/set_state") => set_relay_state(device, body),
        (Method::Get, "/api/relay/get_state") => Ok(ApiResponse::success(
            json!({ "state": if device.relay_on() { "on" } else { "off" } }),
        )),
        (Method::Post, "/api/relay/toggle") => toggle_relay(device, body, now),

        (Method::Get, "/api/time/get") => Ok(ApiResponse::success(
            serde_json::to_value(device.time()).unwrap_or(Value::Null),
        )),
        (Method::Post, "/api/time/set") => set_time(device, body),

        (Method::Post, "/api/users/add_tag") => add_tag(device, body),
        (Method::Post, "/api/users/delete_tag") => delete_tag(device, body),
        (Method::Post, "/api/users/delete_all_tags") => device
            .registry()
            .clear_all()
            .map(|_| ApiResponse::message("delete All done"))
            .map_err(registry_error),
        (Method::Post, "/api/users/check_tag") => check_tag(device, body),
        (Method::Post, "/api/users/use_tag") => use_tag(device, body, now),
        (Method::Get, "/api/users/get_count") => device
            .registry()
            .count()
            .map(|count| ApiResponse::success(json!({ "count": count })))
            .map_err(registry_error),
        (Method::Get, "/api/users/get_tags") => device
            .registry()
            .list()
            .map(|tags| ApiResponse::success(json!({ "users": tags.join(",") })))
            .map_err(registry_error),
        (Method::Post, "/api/users/add_card") => set_card(device, body, MasterCard::Add),
        (Method::Post, "/api/users/remove_card") => set_card(device, body, MasterCard::Remove),

        _ => Err(ApiResponse::error(404, format!("Not found: {path}"))),
    };
    handled.unwrap_or_else(|resp| resp)
}

fn parse(body: &str) -> Result<Value, ApiResponse> {
    if body.trim().is_empty() {
        return Err(ApiResponse::error(400, "Missing body"));
    }
    serde_json::from_str(body).map_err(|_| ApiResponse::error(400, "Invalid JSON"))
}

/// String field; numbers are accepted and rendered in decimal.
fn text_field(doc: &Value, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_field(doc: &Value, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pull and validate a tag field.
fn tag_field(doc: &Value, key: &str) -> Result<String, ApiResponse> {
    let tag = text_field(doc, key)
        .ok_or_else(|| ApiResponse::bad_request(&format!("{{\"{key}\":\"11_digits\"}}")))?;
    codec::validate(&tag).map_err(|e| ApiResponse::error(400, e.to_string()))?;
    Ok(tag)
}

fn internal(err: DeviceError) -> ApiResponse {
    match err {
        DeviceError::Registry(e) => registry_error(e),
        DeviceError::Settings(e) => settings_error(e),
        DeviceError::Clock(e) => ApiResponse::error(400, e.to_string()),
        DeviceError::InvalidDuration => ApiResponse::error(400, err.to_string()),
    }
}

fn registry_error(err: RegistryError) -> ApiResponse {
    match err {
        RegistryError::DuplicateTag => ApiResponse::error(409, "Tag already exists"),
        RegistryError::RegistryFull { max } => ApiResponse::error(
            507,
            format!("No empty slots for user tags (max {max}) or max tags reached"),
        ),
        RegistryError::NotFound => ApiResponse::error(404, "User tag not found"),
        other => {
            error!("api: registry failure: {}", other);
            ApiResponse::error(500, other.to_string())
        }
    }
}

fn settings_error(err: SettingsError) -> ApiResponse {
    match err {
        SettingsError::Store(e) => {
            error!("api: settings store failure: {}", e);
            ApiResponse::error(500, e.to_string())
        }
        other => ApiResponse::error(400, other.to_string()),
    }
}

fn status<S: ByteStore, P: RelayPin, C: Rtc>(device: &mut Device<S, P, C>) -> Handled {
    let count = device.registry().count().map_err(registry_error)?;
    Ok(ApiResponse::success(json!({
        "firmwareVersion": FIRMWARE_VERSION,
        "uptime": device.uptime().as_secs(),
        "tagCount": count,
        "relay": if device.relay_on() { "on" } else { "off" },
    })))
}

fn set_op_method<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let doc = parse(body)?;
    let method = int_field(&doc, "method")
        .filter(|m| *m == 0 || *m == 1)
        .ok_or_else(|| ApiResponse::bad_request("{\"method\":0} or {\"method\":1}"))?;
    device
        .settings()
        .set_op_method(method as u8)
        .map_err(settings_error)?;
    Ok(ApiResponse::message(format!(
        "Operation method set to {method}"
    )))
}

fn set_ssid<S: ByteStore, P: RelayPin, C: Rtc>(device: &mut Device<S, P, C>, body: &str) -> Handled {
    let doc = parse(body)?;
    let ssid = text_field(&doc, "ssid")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiResponse::bad_request("{\"ssid\":\"your_ssid\"}"))?;
    device.settings().set_ssid(&ssid).map_err(settings_error)?;
    Ok(ApiResponse::message("SSID saved"))
}

fn set_password<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let doc = parse(body)?;
    let password = text_field(&doc, "password")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiResponse::bad_request("{\"password\":\"your_password\"}"))?;
    device
        .settings()
        .set_password(&password)
        .map_err(settings_error)?;
    Ok(ApiResponse::message("Password saved"))
}

fn network_info<S: ByteStore, P: RelayPin, C: Rtc>(device: &mut Device<S, P, C>) -> Handled {
    let mut settings = device.settings();
    let ssid = settings.ssid().map_err(settings_error)?;
    let password = settings.password().map_err(settings_error)?;
    Ok(ApiResponse::success(
        json!({ "ssid": ssid, "password": password }),
    ))
}

fn set_network_info<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let doc = parse(body)?;
    let expected = "{\"ssid\":\"...\",\"password\":\"...\"}";
    let ssid = text_field(&doc, "ssid")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiResponse::bad_request(expected))?;
    let password = text_field(&doc, "password")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiResponse::bad_request(expected))?;
    let mut settings = device.settings();
    settings.set_ssid(&ssid).map_err(settings_error)?;
    settings.set_password(&password).map_err(settings_error)?;
    Ok(ApiResponse::message("network updated"))
}

fn set_relay_state<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let doc = parse(body)?;
    let on = match text_field(&doc, "state").map(|s| s.to_ascii_lowercase()) {
        Some(s) if s == "on" => true,
        Some(s) if s == "off" => false,
        _ => {
            return Err(ApiResponse::bad_request(
                "{\"state\":\"on\"} or {\"state\":\"off\"}",
            ))
        }
    };
    device.set_relay(on).map_err(internal)?;
    Ok(ApiResponse::message(format!(
        "Relay set to {}",
        if on { "ON" } else { "OFF" }
    )))
}

fn toggle_relay<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
    now: Instant,
) -> Handled {
    let doc = parse(body)?;
    let max = MAX_PULSE.as_secs() as i64;
    let secs = int_field(&doc, "duration")
        .filter(|d| (1..=max).contains(d))
        .ok_or_else(|| {
            ApiResponse::bad_request(&format!("{{\"duration\":N}} with 1 <= N <= {max}"))
        })?;
    device
        .pulse_relay(Duration::from_secs(secs as u64), now)
        .map_err(internal)?;
    Ok(ApiResponse::message(format!(
        "Relay toggled ON for {secs} seconds"
    )))
}

fn set_time<S: ByteStore, P: RelayPin, C: Rtc>(device: &mut Device<S, P, C>, body: &str) -> Handled {
    let doc = parse(body)?;
    let fields: TimeFields = serde_json::from_value(doc).map_err(|_| {
        ApiResponse::bad_request(
            "{\"year\":..,\"month\":..,\"day\":..,\"hour\":..,\"minute\":..,\"second\":..}",
        )
    })?;
    device.set_time(fields).map_err(internal)?;
    Ok(ApiResponse::message("time updated"))
}

fn add_tag<S: ByteStore, P: RelayPin, C: Rtc>(device: &mut Device<S, P, C>, body: &str) -> Handled {
    let tag = tag_field(&parse(body)?, "tag")?;
    device.registry().insert(&tag).map_err(registry_error)?;
    Ok(ApiResponse::message("User tag added"))
}

fn delete_tag<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let tag = tag_field(&parse(body)?, "tag")?;
    device.registry().delete(&tag).map_err(registry_error)?;
    Ok(ApiResponse::message("User tag deleted"))
}

fn found_response(found: bool) -> ApiResponse {
    let message = if found {
        "User tag found"
    } else {
        "User tag not found"
    };
    ApiResponse::success(json!({ "found": found, "message": message }))
}

fn check_tag<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
) -> Handled {
    let tag = tag_field(&parse(body)?, "tag")?;
    let found = device.registry().contains(&tag).map_err(registry_error)?;
    Ok(found_response(found))
}

fn use_tag<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
    now: Instant,
) -> Handled {
    let tag = tag_field(&parse(body)?, "tag")?;
    let found = device.use_tag(&tag, now).map_err(internal)?;
    Ok(found_response(found))
}

fn set_card<S: ByteStore, P: RelayPin, C: Rtc>(
    device: &mut Device<S, P, C>,
    body: &str,
    which: MasterCard,
) -> Handled {
    let card = tag_field(&parse(body)?, "card")?;
    device
        .settings()
        .set_card(which, &card)
        .map_err(settings_error)?;
    let message = match which {
        MasterCard::Add => "ADD card added",
        MasterCard::Remove => "Remove card added",
    };
    Ok(ApiResponse::message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::clock::SystemRtc;
    use crate::device::BootOptions;
    use crate::hw::drivers::relay::HostPin;
    use crate::registry::Layout;
    use crate::store::MemStore;

    type TestDevice = Device<MemStore, HostPin, SystemRtc>;

    fn device() -> TestDevice {
        let store = MemStore::new(Layout::default().end());
        Device::boot(store, HostPin::new(16), SystemRtc::default(), &BootOptions::default())
            .unwrap()
    }

    fn post(device: &mut TestDevice, path: &str, body: &str) -> ApiResponse {
        route(device, Method::Post, path, body, Instant::now())
    }

    fn get(device: &mut TestDevice, path: &str) -> ApiResponse {
        route(device, Method::Get, path, "", Instant::now())
    }

    #[test]
    fn tag_lifecycle_status_codes() {
        let mut dev = device();
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"tag":"123"}"#).status, 200);
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"tag":123}"#).status, 409);
        let tags = get(&mut dev, "/api/users/get_tags");
        assert_eq!(tags.body["users"], "123");
        assert_eq!(get(&mut dev, "/api/users/get_count").body["count"], 1);
        assert_eq!(post(&mut dev, "/api/users/delete_tag", r#"{"tag":"123"}"#).status, 200);
        assert_eq!(post(&mut dev, "/api/users/delete_tag", r#"{"tag":"123"}"#).status, 404);
    }

    #[test]
    fn invalid_tags_are_rejected_before_registry() {
        let mut dev = device();
        let long = post(&mut dev, "/api/users/add_tag", r#"{"tag":"123456789012"}"#);
        assert_eq!(long.status, 400);
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"tag":"12x"}"#).status, 400);
        assert_eq!(post(&mut dev, "/api/users/add_tag", "{tag").body["message"], "Invalid JSON");
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"id":"1"}"#).status, 400);
        assert_eq!(dev.registry().count().unwrap(), 0);
    }

    #[test]
    fn full_registry_reports_507() {
        let layout = Layout::with_capacity(1);
        let opts = BootOptions {
            layout,
            ..BootOptions::default()
        };
        let store = MemStore::new(layout.end());
        let mut dev =
            Device::boot(store, HostPin::new(16), SystemRtc::default(), &opts).unwrap();
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"tag":"1"}"#).status, 200);
        assert_eq!(post(&mut dev, "/api/users/add_tag", r#"{"tag":"2"}"#).status, 507);
    }

    #[test]
    fn use_tag_pulses_relay() {
        let mut dev = device();
        post(&mut dev, "/api/users/add_tag", r#"{"tag":"77"}"#);
        let resp = post(&mut dev, "/api/users/use_tag", r#"{"tag":"77"}"#);
        assert_eq!(resp.body["found"], true);
        assert_eq!(get(&mut dev, "/api/relay/get_state").body["state"], "on");
        let resp = post(&mut dev, "/api/users/check_tag", r#"{"tag":"78"}"#);
        assert_eq!(resp.body["found"], false);
    }

    #[test]
    fn relay_and_method_validation() {
        let mut dev = device();
        assert_eq!(post(&mut dev, "/api/relay/set_state", r#"{"state":"ON"}"#).status, 200);
        assert!(dev.relay_on());
        assert_eq!(post(&mut dev, "/api/relay/set_state", r#"{"state":"dim"}"#).status, 400);
        assert_eq!(post(&mut dev, "/api/relay/toggle", r#"{"duration":0}"#).status, 400);
        for huge in [r#"{"duration":3601}"#, r#"{"duration":9223372036854775807}"#] {
            assert_eq!(post(&mut dev, "/api/relay/toggle", huge).status, 400);
        }
        assert_eq!(dev.next_deadline(), None);
        assert_eq!(post(&mut dev, "/api/relay/toggle", r#"{"duration":3600}"#).status, 200);
        assert_eq!(post(&mut dev, "/api/op_method", r#"{"method":2}"#).status, 400);
        assert_eq!(post(&mut dev, "/api/op_method", r#"{"method":1}"#).status, 200);
        assert_eq!(get(&mut dev, "/api/op_method").body["method"], 1);
    }

    #[test]
    fn wifi_and_cards() {
        let mut dev = device();
        let resp = post(
            &mut dev,
            "/api/wifi/set_network_info",
            r#"{"ssid":"lab","password":"hunter22"}"#,
        );
        assert_eq!(resp.status, 200);
        let info = get(&mut dev, "/api/wifi/get_network_info");
        assert_eq!(info.body["ssid"], "lab");
        assert_eq!(info.body["password"], "hunter22");
        assert_eq!(post(&mut dev, "/api/wifi/set_ssid", r#"{"ssid":""}"#).status, 400);
        assert_eq!(post(&mut dev, "/api/users/add_card", r#"{"card":"5"}"#).status, 200);
        assert_eq!(dev.settings().card(MasterCard::Add).unwrap(), "00000000005");
    }

    #[test]
    fn time_roundtrip_and_unknown_route() {
        let mut dev = device();
        let body = r#"{"year":2030,"month":1,"day":2,"hour":3,"minute":4,"second":5}"#;
        assert_eq!(post(&mut dev, "/api/time/set", body).status, 200);
        assert_eq!(get(&mut dev, "/api/time/get").body["year"], 2030);
        let bad = r#"{"year":2030,"month":13,"day":2,"hour":3,"minute":4,"second":5}"#;
        assert_eq!(post(&mut dev, "/api/time/set", bad).status, 400);
        assert_eq!(get(&mut dev, "/nope?x=1").status, 404);
        assert_eq!(get(&mut dev, "/api/users/add_tag").status, 404);
    }
}
