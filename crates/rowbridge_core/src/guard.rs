//! Boundary guard around client-library calls.

use crate::error::{BridgeError, BridgeResult};
use rowbridge_client::ClientResult;
use std::panic::{self, AssertUnwindSafe};

/// Runs a client-library call and converts its failures into host errors.
///
/// A client error becomes [`BridgeError::Native`] with its message intact.
/// A panic inside the client is caught and becomes
/// [`BridgeError::NativePanic`], so it never unwinds into the host.
///
/// # Errors
///
/// Returns the converted failure.
pub fn guarded<T, F>(operation: &'static str, f: F) -> BridgeResult<T>
where
    F: FnOnce() -> ClientResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::debug!(operation, error = %err, "client call failed");
            Err(BridgeError::Native(err))
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| format!("client library panicked in '{operation}'"));
            tracing::warn!(operation, %message, "client call panicked");
            Err(BridgeError::NativePanic { message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowbridge_client::ClientError;

    #[test]
    fn passes_values_through() {
        assert_eq!(guarded("sql", || Ok(3)).unwrap(), 3);
    }

    #[test]
    fn keeps_native_message() {
        let err = guarded::<(), _>("sql", || {
            Err(ClientError::execution("Table 'test.nope' doesn't exist"))
        })
        .unwrap_err();
        assert!(err.is_native());
        assert_eq!(err.to_string(), "Table 'test.nope' doesn't exist");
    }

    #[test]
    fn catches_panics() {
        let err = guarded::<(), _>("at", || panic!("driver exploded")).unwrap_err();
        assert!(matches!(&err, BridgeError::NativePanic { message } if message == "driver exploded"));

        let err = guarded::<(), _>("at", || std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(err.to_string(), "client library panicked in 'at'");
    }
}
