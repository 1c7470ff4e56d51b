//! NGINX-specific helper functions

use crate::bridge::BridgeStatus;
use ngx::core::Buffer;
use ngx::ffi::ngx_chain_t;
use ngx::http::Request;
use ngx::{core::Status, http};

/// Outcome of the status endpoint, before it touches the request
#[derive(Debug, PartialEq, Eq)]
pub enum StatusReply {
    Report(String),
    NotInstalled,
    Failed(String),
}

impl StatusReply {
    /// Render the bridge snapshot (pure, testable)
    pub fn from_status(status: Option<&BridgeStatus>) -> Self {
        match status {
            None => StatusReply::NotInstalled,
            Some(status) => match serde_json::to_string_pretty(status) {
                Ok(body) => StatusReply::Report(body),
                Err(e) => StatusReply::Failed(format!("JSON serialization failed: {}", e)),
            },
        }
    }

    fn http_status(&self) -> http::HTTPStatus {
        match self {
            StatusReply::Report(_) => http::HTTPStatus::OK,
            StatusReply::NotInstalled => http::HTTPStatus::SERVICE_UNAVAILABLE,
            StatusReply::Failed(_) => http::HTTPStatus::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> &str {
        match self {
            StatusReply::Report(body) => body,
            StatusReply::NotInstalled => r#"{"error":"log bridge not installed"}"#,
            StatusReply::Failed(_) => r#"{"error":"status unavailable"}"#,
        }
    }
}

/// Write a status reply as an `application/json` response
pub fn send_status_reply(request: &mut Request, reply: &StatusReply) -> Status {
    let Some(mut buf) = request.pool().create_buffer_from_str(reply.body()) else {
        return http::HTTPStatus::INTERNAL_SERVER_ERROR.into();
    };

    buf.set_last_buf(request.is_main());
    buf.set_last_in_chain(true);

    request.discard_request_body();
    request.set_status(reply.http_status());
    request.add_header_out("Content-Type", "application/json; charset=utf-8");

    let rc = request.send_header();
    if rc == Status::NGX_ERROR || rc > Status::NGX_OK || request.header_only() {
        return rc;
    }

    let mut out = ngx_chain_t {
        buf: buf.as_ngx_buf_mut(),
        next: std::ptr::null_mut(),
    };
    request.output_filter(&mut out);
    Status::NGX_DONE
}
