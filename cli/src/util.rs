use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Print a structured usage error and exit with code 4.
pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", pretty(&err));
    std::process::exit(4);
}

pub fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Exit code for an HTTP status: 0=success (2xx), 1=client error (4xx),
/// 2=server error (5xx and anything else).
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

fn connection_error(message: String) -> serde_json::Value {
    json!({
        "error": "connection_error",
        "message": message,
        "docs_hint": "Is the Kid API running? Check KID_API_URL."
    })
}

/// Execute an API request, print the response, exit with structured code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
    raw: bool,
) -> i32 {
    let (status, resp_body) = match raw_api_request(api_url, method, path, body).await {
        Ok(result) => result,
        Err(RequestError::Usage(message)) => {
            eprintln!("{}", pretty(&json!({"error": "cli_error", "message": message})));
            return 4;
        }
        Err(RequestError::Connection(message)) => {
            eprintln!("{}", pretty(&connection_error(message)));
            return 3;
        }
    };

    let formatted = if raw {
        resp_body.to_string()
    } else {
        pretty(&resp_body)
    };

    let exit_code = exit_code_for(status);
    if exit_code == 0 {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }

    exit_code
}

#[derive(Debug)]
pub enum RequestError {
    Usage(String),
    Connection(String),
}

/// Execute an API request and return the response (no printing).
/// Used by commands that need to inspect the response.
pub async fn raw_api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> Result<(u16, serde_json::Value), RequestError> {
    let url = reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/')))
        .map_err(|e| RequestError::Usage(format!("Invalid URL: {api_url}{path}: {e}")))?;

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = req
        .send()
        .await
        .map_err(|e| RequestError::Connection(format!("{e}")))?;
    let status = resp.status().as_u16();
    let body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };

    Ok((status, body))
}

/// Print a connection failure the way `api_request` does and return its code.
pub fn report_connection_error(message: String) -> i32 {
    eprintln!("{}", pretty(&connection_error(message)));
    3
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin()).map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_status_class() {
        assert_eq!(exit_code_for(200), 0);
        assert_eq!(exit_code_for(400), 1);
        assert_eq!(exit_code_for(429), 1);
        assert_eq!(exit_code_for(500), 2);
        assert_eq!(exit_code_for(302), 2);
    }

    #[test]
    fn missing_history_file_is_reported() {
        let err = read_json_from_file("/nonexistent/kid-history.json").expect_err("no such file");
        assert!(err.starts_with("Failed to read file"));
    }
}
