//! Binding-layer configuration.

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Log a warning when an integer cell exceeds 2^53 in magnitude.
    pub warn_on_unsafe_integers: bool,

    /// Include the query text in debug logs. Off by default since queries may
    /// carry literals the caller considers sensitive.
    pub log_query_text: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            warn_on_unsafe_integers: true,
            log_query_text: false,
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether unsafe integers are logged.
    #[must_use]
    pub const fn warn_on_unsafe_integers(mut self, value: bool) -> Self {
        self.warn_on_unsafe_integers = value;
        self
    }

    /// Sets whether query text is logged.
    #[must_use]
    pub const fn log_query_text(mut self, value: bool) -> Self {
        self.log_query_text = value;
        self
    }
}
