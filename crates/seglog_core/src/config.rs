//! Log configuration.

/// What index recovery does when a data file ends inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// A torn record is corruption and aborts recovery.
    #[default]
    Strict,
    /// A torn final record is cut from the data file and recovery continues.
    ///
    /// Only the unacknowledged tail of an interrupted append is ever lost
    /// this way, provided appends are synced.
    TruncateTornTail,
}

/// Configuration for opening a log.
///
/// The storage root is not part of the configuration; it is passed to
/// [`Log::open_with_config`](crate::Log::open_with_config) explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the storage root if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the data and index files after every append.
    ///
    /// With `false`, an acknowledged append survives a process crash but
    /// not necessarily a power loss until [`Log::sync`](crate::Log::sync)
    /// or [`Log::close`](crate::Log::close) runs.
    pub sync_on_append: bool,

    /// How index recovery treats a torn final record.
    pub recovery_policy: RecoveryPolicy,

    /// Data file size at which the active segment is sealed and a new one
    /// opened. `None` keeps a single active segment forever.
    pub max_segment_bytes: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_append: true,
            recovery_policy: RecoveryPolicy::Strict,
            max_segment_bytes: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the storage root if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync after every append.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    /// Sets the torn-record recovery policy.
    #[must_use]
    pub const fn recovery_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.recovery_policy = policy;
        self
    }

    /// Enables segment rotation once the active data file reaches `bytes`.
    #[must_use]
    pub const fn max_segment_bytes(mut self, bytes: u64) -> Self {
        self.max_segment_bytes = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_on_append);
        assert_eq!(config.recovery_policy, RecoveryPolicy::Strict);
        assert_eq!(config.max_segment_bytes, None);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .sync_on_append(false)
            .recovery_policy(RecoveryPolicy::TruncateTornTail)
            .max_segment_bytes(1024);

        assert!(!config.create_if_missing);
        assert!(!config.sync_on_append);
        assert_eq!(config.recovery_policy, RecoveryPolicy::TruncateTornTail);
        assert_eq!(config.max_segment_bytes, Some(1024));
    }
}
