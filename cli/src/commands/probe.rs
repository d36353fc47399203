use kid_core::chat::{EXTRACTION_PLACEHOLDER, preview};
use serde_json::json;

use crate::util::{RequestError, exit_code_for, pretty, raw_api_request, report_connection_error};

/// Send one message end to end and report whether a real reply came back.
///
/// Exit codes: 0 when /chat answered with usable text, 2 when the service
/// answered but the reply was an error or the extraction placeholder,
/// 3 when the service could not be reached.
pub async fn run(api_url: &str, message: &str) -> i32 {
    let health = match raw_api_request(api_url, reqwest::Method::GET, "/health", None).await {
        Ok((_, body)) => body,
        Err(RequestError::Connection(e)) => return report_connection_error(e),
        Err(RequestError::Usage(e)) => crate::util::exit_error(&e, None),
    };

    let request = json!({ "message": message });
    let (status, body) =
        match raw_api_request(api_url, reqwest::Method::POST, "/chat", Some(request)).await {
            Ok(result) => result,
            Err(RequestError::Connection(e)) => return report_connection_error(e),
            Err(RequestError::Usage(e)) => crate::util::exit_error(&e, None),
        };

    let (ok, text) = assess(status, &body);
    let report = json!({
        "ok": ok,
        "status": status,
        "backend": health.get("backend").cloned().unwrap_or(serde_json::Value::Null),
        "mode": body.get("mode").cloned().unwrap_or(serde_json::Value::Null),
        "response_preview": text.map(|t| preview(t, 200)),
        "error": body.get("error").cloned(),
        "details": body.get("details").cloned(),
    });

    if ok {
        println!("{}", pretty(&report));
        0
    } else {
        eprintln!("{}", pretty(&report));
        exit_code_for(status).max(2)
    }
}

fn assess(status: u16, body: &serde_json::Value) -> (bool, Option<&str>) {
    let text = body.get("response").and_then(|v| v.as_str());
    let ok = status == 200
        && text.is_some_and(|t| !t.trim().is_empty() && t != EXTRACTION_PLACEHOLDER);
    (ok, text)
}
