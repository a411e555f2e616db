//! Classification for `reqwest` errors.
//!
//! Turn non-success responses into errors with
//! [`error_for_status`](reqwest::Response::error_for_status) so their status
//! reaches the classifier. Timeouts report the `TimeoutError` kind and
//! connection failures report `NetworkError`, both transient under the
//! default policy.

use crate::classify::RetryableError;

impl RetryableError for reqwest::Error {
    fn error_kind(&self) -> Option<&str> {
        if self.is_timeout() {
            Some("TimeoutError")
        } else if self.is_connect() {
            Some("NetworkError")
        } else {
            None
        }
    }

    fn status_code(&self) -> Option<u16> {
        self.status().map(|status| status.as_u16())
    }
}
