//! HTTP middleware components.

pub mod admin;
pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod trace_id;

pub use admin::{has_admin_access, require_admin_key, ADMIN_KEY_HEADER};
pub use logging::init_logging;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use security_headers::security_headers_middleware;
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
