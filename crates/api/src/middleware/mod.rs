//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod session;
pub mod trace_id;

pub use logging::init_logging;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
pub use security_headers::{security_headers_middleware, HstsPolicy};
pub use session::{require_admin, require_login, SessionUser};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
