//! External control surface: the extension-style message protocol and
//! URL-parameter activation.
//!
//! Requests arrive as JSON `{action, selector?}` objects; responses
//! always carry `success` and usually a human-readable `message`.
//! Unknown actions and requests against an unloaded inspector yield
//! `{success: false, message}` rather than errors.

use crate::error::Error;
use crate::inspect::session::{InspectorSession, VERSION};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(default)]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Response {
    fn ok(message: impl Into<String>) -> Self {
        Response {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Response {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Holds the (possibly not yet loaded) session behind the message
/// endpoint, mirroring a page where the inspector script may or may
/// not have run.
#[derive(Default)]
pub struct MessageEndpoint {
    pub session: Option<InspectorSession>,
}

impl MessageEndpoint {
    pub fn new(session: InspectorSession) -> Self {
        MessageEndpoint {
            session: Some(session),
        }
    }

    /// Dispatches one request. `status` works even when nothing is
    /// loaded; everything else requires a session.
    pub fn handle(&mut self, request: &Request) -> Response {
        if request.action == "status" {
            return self.status();
        }
        let Some(session) = self.session.as_mut() else {
            return Response::failure("Inspector not loaded");
        };
        match request.action.as_str() {
            "enable" => {
                session.enable();
                Response::ok("Inspector enabled")
            }
            "disable" => {
                session.disable();
                Response::ok("Inspector disabled")
            }
            "toggle" => {
                let is_active = session.toggle();
                Response {
                    is_active: Some(is_active),
                    ..Response::ok(if is_active {
                        "Inspector enabled"
                    } else {
                        "Inspector disabled"
                    })
                }
            }
            "selectElement" => match request.selector.as_deref() {
                Some(selector) if session.select_element(selector) => {
                    Response::ok(format!("Selected: {}", selector))
                }
                Some(selector) => Response::failure(format!("No element matches: {}", selector)),
                None => Response::failure("No selector provided"),
            },
            other => Response::failure(format!("Unknown action: {}", other)),
        }
    }

    fn status(&self) -> Response {
        let loaded = self.session.is_some();
        Response {
            success: true,
            loaded: Some(loaded),
            active: Some(
                self.session
                    .as_ref()
                    .map(InspectorSession::is_active)
                    .unwrap_or(false),
            ),
            version: loaded.then(|| VERSION.to_string()),
            ..Default::default()
        }
    }

    /// JSON-in, JSON-out variant for transports that ship raw strings.
    pub fn handle_json(&mut self, request_json: &str) -> String {
        let response = match serde_json::from_str::<Request>(request_json) {
            Ok(request) => self.handle(&request),
            Err(err) => Response::failure(format!("Malformed request: {}", err)),
        };
        serde_json::to_string(&response).unwrap_or_else(|_| r#"{"success":false}"#.to_string())
    }
}

/// Applies activation-related query parameters from a page URL:
/// `domscope=true|1|enable` auto-enables the inspector and
/// `inspect=<selector>` auto-selects an element.
pub fn apply_url_parameters(session: &mut InspectorSession, page_url: &str) -> Result<(), Error> {
    let url = Url::parse(page_url)?;
    let mut auto_enable = false;
    let mut inspect_selector: Option<String> = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "domscope" => {
                auto_enable = matches!(value.as_ref(), "true" | "1" | "enable");
            }
            "inspect" => {
                inspect_selector = Some(value.into_owned());
            }
            _ => {}
        }
    }
    if auto_enable {
        log::info!("inspector auto-enabled via url parameter");
        session.enable();
    }
    if let Some(selector) = inspect_selector {
        if !session.select_element(&selector) {
            log::warn!("url parameter selector matched nothing: {}", selector);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<p id="msg" class="card">Hello</p>"#;

    fn endpoint() -> MessageEndpoint {
        MessageEndpoint::new(InspectorSession::load(PAGE))
    }

    fn request(action: &str, selector: Option<&str>) -> Request {
        Request {
            action: action.to_string(),
            selector: selector.map(str::to_string),
        }
    }

    #[test]
    fn toggle_reports_the_new_state() {
        let mut endpoint = endpoint();
        let response = endpoint.handle(&request("toggle", None));
        assert!(response.success);
        assert_eq!(response.is_active, Some(true));
        let response = endpoint.handle(&request("toggle", None));
        assert_eq!(response.is_active, Some(false));
    }

    #[test]
    fn status_reports_loaded_active_and_version() {
        let mut endpoint = endpoint();
        endpoint.handle(&request("enable", None));
        let response = endpoint.handle(&request("status", None));
        assert_eq!(response.loaded, Some(true));
        assert_eq!(response.active, Some(true));
        assert_eq!(response.version.as_deref(), Some(VERSION));
    }

    #[test]
    fn unloaded_endpoint_rejects_everything_but_status() {
        let mut endpoint = MessageEndpoint::default();
        let response = endpoint.handle(&request("enable", None));
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Inspector not loaded"));

        let status = endpoint.handle(&request("status", None));
        assert!(status.success);
        assert_eq!(status.loaded, Some(false));
        assert_eq!(status.version, None);
    }

    #[test]
    fn unknown_action_fails_gracefully() {
        let mut endpoint = endpoint();
        let response = endpoint.handle(&request("explode", None));
        assert!(!response.success);
    }

    #[test]
    fn select_element_round_trips_over_json() {
        let mut endpoint = endpoint();
        let json = endpoint.handle_json(r##"{"action":"selectElement","selector":"#msg"}"##);
        assert!(json.contains(r#""success":true"#));
        let json = endpoint.handle_json(r#"{"action":"selectElement","selector":".nope"}"#);
        assert!(json.contains(r#""success":false"#));
    }

    #[test]
    fn url_parameters_enable_and_select() {
        let mut session = InspectorSession::load(PAGE);
        apply_url_parameters(&mut session, "https://example.com/page?domscope=1&inspect=%23msg")
            .unwrap();
        assert!(session.is_active());
        assert!(session.target().is_some());
    }

    #[test]
    fn malformed_url_is_an_error() {
        let mut session = InspectorSession::load(PAGE);
        assert!(apply_url_parameters(&mut session, "not a url").is_err());
    }
}
