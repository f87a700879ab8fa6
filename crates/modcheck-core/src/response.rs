//! Status codes returned by the module's `int` exports.

use std::fmt;

/// Known module return codes. `0` is success; `1xx` are instance-level
/// failures; `2xx` map data-store statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResponseCode {
    Success = 0,

    Unknown = 100,
    FailedToParseConfiguration = 101,
    FailedToLoadState = 102,
    FailedToParseRequest = 103,
    ServerInstanceAlreadyExists = 104,
    ServerInstanceNotFound = 105,
    FailedToStartServer = 106,
    CurrentDataStoreDoesNotSupportStateLoading = 107,

    DataStoreNotFound = 200,
    DataStoreConflict = 201,
    DataStoreBadRequest = 202,
}

impl ResponseCode {
    pub const ALL: [Self; 12] = [
        Self::Success,
        Self::Unknown,
        Self::FailedToParseConfiguration,
        Self::FailedToLoadState,
        Self::FailedToParseRequest,
        Self::ServerInstanceAlreadyExists,
        Self::ServerInstanceNotFound,
        Self::FailedToStartServer,
        Self::CurrentDataStoreDoesNotSupportStateLoading,
        Self::DataStoreNotFound,
        Self::DataStoreConflict,
        Self::DataStoreBadRequest,
    ];

    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_raw() == raw)
    }

    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown",
            Self::FailedToParseConfiguration => "FailedToParseConfiguration",
            Self::FailedToLoadState => "FailedToLoadState",
            Self::FailedToParseRequest => "FailedToParseRequest",
            Self::ServerInstanceAlreadyExists => "ServerInstanceAlreadyExists",
            Self::ServerInstanceNotFound => "ServerInstanceNotFound",
            Self::FailedToStartServer => "FailedToStartServer",
            Self::CurrentDataStoreDoesNotSupportStateLoading => {
                "CurrentDataStoreDoesNotSupportStateLoading"
            }
            Self::DataStoreNotFound => "DataStoreNotFound",
            Self::DataStoreConflict => "DataStoreConflict",
            Self::DataStoreBadRequest => "DataStoreBadRequest",
        }
    }

    /// `"104 (ServerInstanceAlreadyExists)"`, or just the number when the
    /// code is not one of the known values.
    #[must_use]
    pub fn describe(raw: i32) -> String {
        match Self::from_raw(raw) {
            Some(code) => format!("{raw} ({})", code.name()),
            None => raw.to_string(),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip() {
        for code in ResponseCode::ALL {
            assert_eq!(ResponseCode::from_raw(code.as_raw()), Some(code));
        }
        assert_eq!(ResponseCode::from_raw(7), None);
    }

    #[test]
    fn describe_names_known_codes() {
        assert_eq!(ResponseCode::describe(104), "104 (ServerInstanceAlreadyExists)");
        assert_eq!(ResponseCode::describe(-1), "-1");
        assert!(ResponseCode::Success.is_success());
        assert!(!ResponseCode::DataStoreConflict.is_success());
    }
}
