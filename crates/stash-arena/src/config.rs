//! Arena configuration parameters.

use stash_core::FailurePolicy;

use crate::error::ArenaError;

/// Configuration for a temporary storage arena.
///
/// Validated at construction; immutable for the arena's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the arena buffer in bytes.
    ///
    /// Default: 65_536 (64 KiB). Must be non-zero.
    pub capacity: usize,

    /// Alignment used when a caller passes an alignment of 0.
    ///
    /// Default: 8. Must be a power of two.
    pub default_align: usize,

    /// Zero reclaimed bytes on reset.
    ///
    /// Default: on in debug builds, off in release builds.
    pub clear_on_reset: bool,

    /// What to do on a bad alignment or an illegal rewind.
    pub failure_policy: FailurePolicy,
}

impl ArenaConfig {
    /// Default buffer size: 64 KiB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Default alignment for requests that pass 0.
    pub const DEFAULT_ALIGN: usize = 8;

    /// Create a config with the given capacity and defaults for the rest.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_align: Self::DEFAULT_ALIGN,
            clear_on_reset: cfg!(debug_assertions),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "capacity must be non-zero".into(),
            });
        }
        if self.capacity > isize::MAX as usize {
            return Err(ArenaError::InvalidConfig {
                reason: format!("capacity {} exceeds isize::MAX", self.capacity),
            });
        }
        if !self.default_align.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "default_align must be a power of two, got {}",
                    self.default_align
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_64k() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity, 65_536);
        assert_eq!(config.default_align, 8);
        assert_eq!(config.clear_on_reset, cfg!(debug_assertions));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            ArenaConfig::new(0).validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn odd_default_align_rejected() {
        let config = ArenaConfig {
            default_align: 6,
            ..ArenaConfig::new(64)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("power of two"));
    }
}
