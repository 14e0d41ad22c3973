//! User-facing error messages.
//!
//! The backend reports failures in several envelope shapes (plain
//! `message`, ASP.NET problem details, validation `errors` lists). This
//! module pulls the most specific human-readable text out of a body and
//! falls back to a fixed Vietnamese table keyed by status code.

use serde_json::Value;

/// Shown when the request never reached the backend.
pub const NETWORK_ERROR: &str = "Không thể kết nối đến máy chủ. Vui lòng kiểm tra kết nối mạng.";

/// Fallback message for a status code when the body carries none.
#[must_use]
pub fn fallback_message(status: u16) -> String {
    let msg = match status {
        400 => "Yêu cầu không hợp lệ.",
        401 => "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.",
        403 => "Bạn không có quyền thực hiện thao tác này.",
        404 => "Không tìm thấy dữ liệu yêu cầu.",
        409 => "Dữ liệu bị xung đột. Vui lòng tải lại và thử lại.",
        413 => "Tệp tải lên quá lớn.",
        422 => "Dữ liệu không hợp lệ.",
        429 => "Bạn đã gửi quá nhiều yêu cầu. Vui lòng thử lại sau.",
        500 => "Lỗi máy chủ. Vui lòng thử lại sau.",
        502 => "Máy chủ không phản hồi hợp lệ.",
        503 => "Dịch vụ tạm thời không khả dụng.",
        504 => "Máy chủ phản hồi quá chậm. Vui lòng thử lại sau.",
        _ => return format!("Đã xảy ra lỗi (mã {status})."),
    };
    msg.to_string()
}

/// Extracts a message from a JSON error body.
///
/// Precedence: `message`, `error`, `detail`, field-level `errors`, `title`.
#[must_use]
pub fn extract_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    non_empty_str(obj.get("message"))
        .or_else(|| match obj.get("error") {
            Some(Value::Object(inner)) => non_empty_str(inner.get("message")),
            other => non_empty_str(other),
        })
        .or_else(|| non_empty_str(obj.get("detail")))
        .or_else(|| obj.get("errors").and_then(field_errors))
        .or_else(|| non_empty_str(obj.get("title")))
}

/// Message for a failed response: body text first, then the status table.
#[must_use]
pub fn message_for(status: u16, body: &Value) -> String {
    extract_message(body).unwrap_or_else(|| fallback_message(status))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Renders `errors` as `field: message` pairs joined by `; `.
///
/// Accepts `[{"field": .., "message": ..}]`, `["msg", ..]` and the ASP.NET
/// map form `{"Field": ["msg", ..]}`.
fn field_errors(errors: &Value) -> Option<String> {
    let parts: Vec<String> = match errors {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(entry) => {
                    let message = non_empty_str(entry.get("message"))
                        .or_else(|| non_empty_str(entry.get("errorMessage")))?;
                    match non_empty_str(entry.get("field"))
                        .or_else(|| non_empty_str(entry.get("propertyName")))
                    {
                        Some(field) => Some(format!("{field}: {message}")),
                        None => Some(message),
                    }
                }
                _ => None,
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, msgs)| {
                let list: Vec<&str> = match msgs {
                    Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                    Value::String(s) => vec![s.as_str()],
                    _ => Vec::new(),
                };
                list.into_iter()
                    .map(move |m| format!("{field}: {m}"))
                    .collect::<Vec<_>>()
            })
            .collect(),
        _ => Vec::new(),
    };

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_errors_array() {
        let body = json!({ "errors": [{ "field": "email", "message": "required" }] });
        let msg = extract_message(&body).unwrap();
        assert!(msg.contains("email: required"));
    }

    #[test]
    fn test_field_errors_map_form() {
        let body = json!({
            "title": "One or more validation errors occurred.",
            "errors": { "Price": ["must be positive"], "Name": ["required"] }
        });
        let msg = extract_message(&body).unwrap();
        assert!(msg.contains("Price: must be positive"));
        assert!(msg.contains("Name: required"));
    }

    #[test]
    fn test_precedence() {
        let body = json!({ "message": "first", "error": "second", "detail": "third" });
        assert_eq!(extract_message(&body).as_deref(), Some("first"));

        let body = json!({ "error": { "message": "nested" }, "title": "t" });
        assert_eq!(extract_message(&body).as_deref(), Some("nested"));

        let body = json!({ "detail": "d", "title": "t" });
        assert_eq!(extract_message(&body).as_deref(), Some("d"));

        let body = json!({ "title": "Unauthorized" });
        assert_eq!(extract_message(&body).as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_blank_and_non_object_bodies() {
        assert_eq!(extract_message(&json!({ "message": "   " })), None);
        assert_eq!(extract_message(&json!("plain text")), None);
        assert_eq!(extract_message(&Value::Null), None);
        assert_eq!(extract_message(&json!({ "errors": [] })), None);
    }

    #[test]
    fn test_fallback_table() {
        assert_eq!(
            message_for(403, &Value::Null),
            "Bạn không có quyền thực hiện thao tác này."
        );
        assert!(fallback_message(418).contains("418"));
        assert_eq!(message_for(500, &json!({ "message": "db down" })), "db down");
    }
}
