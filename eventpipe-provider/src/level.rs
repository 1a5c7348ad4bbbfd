use std::fmt::Display;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde_derive::Serialize;

/// Verbosity threshold for a provider, ordered from least to most detailed.
/// The numeric values are the ones EventPipe and ETW put on the wire.
#[derive(Debug, FromPrimitive, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u32)]
pub enum EventLevel {
    LogAlways = 0,
    Critical = 1,
    Error = 2,
    Warning = 3,
    Informational = 4,
    #[default]
    Verbose = 5,
}

impl EventLevel {
    /// Returns `None` for values outside 0..=5.
    pub fn from_u32(value: u32) -> Option<Self> {
        <Self as FromPrimitive>::from_u32(value)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventLevel::LogAlways => f.write_str("LogAlways"),
            EventLevel::Critical => f.write_str("Critical"),
            EventLevel::Error => f.write_str("Error"),
            EventLevel::Warning => f.write_str("Warning"),
            EventLevel::Informational => f.write_str("Informational"),
            EventLevel::Verbose => f.write_str("Verbose"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_wire_values() {
        assert_eq!(EventLevel::from_u32(0), Some(EventLevel::LogAlways));
        assert_eq!(EventLevel::from_u32(4), Some(EventLevel::Informational));
        assert_eq!(EventLevel::from_u32(5), Some(EventLevel::Verbose));
        assert_eq!(EventLevel::from_u32(6), None);
        assert_eq!(EventLevel::from_u32(u32::MAX), None);
        assert_eq!(EventLevel::Warning.as_u32(), 3);
    }

    #[test]
    fn ordered_by_verbosity() {
        assert!(EventLevel::LogAlways < EventLevel::Critical);
        assert!(EventLevel::Critical < EventLevel::Error);
        assert!(EventLevel::Error < EventLevel::Warning);
        assert!(EventLevel::Warning < EventLevel::Informational);
        assert!(EventLevel::Informational < EventLevel::Verbose);
        assert_eq!(EventLevel::default(), EventLevel::Verbose);
    }
}
