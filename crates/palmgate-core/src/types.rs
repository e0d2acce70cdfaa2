use crate::{
    Result,
    constants::{MAX_USER_NAME_LENGTH, MIN_USER_NAME_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to a scan, determining which branch of the access flow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Security agent: door opens unconditionally.
    Security,
    /// Teacher: a new class session is started before the door opens.
    Teacher,
    /// Student: access depends on an active session and enrollment.
    Student,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserRole::Security => write!(f, "Security"),
            UserRole::Teacher => write!(f, "Teacher"),
            UserRole::Student => write!(f, "Student"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "security" => Ok(UserRole::Security),
            "teacher" => Ok(UserRole::Teacher),
            "student" => Ok(UserRole::Student),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// Transport label shown while a record is in transit.
///
/// No real sockets are involved; the label only tells observers which leg
/// of the device → middleware → app pipeline is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveProtocol {
    /// No transfer in flight.
    #[default]
    None,
    /// Device → middleware leg.
    Tcp,
    /// Middleware → school-app leg.
    Http,
}

impl fmt::Display for ActiveProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActiveProtocol::None => write!(f, "none"),
            ActiveProtocol::Tcp => write!(f, "TCP"),
            ActiveProtocol::Http => write!(f, "HTTP"),
        }
    }
}

/// Source component of an event-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Device,
    Middleware,
    App,
    Door,
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogCategory::Device => write!(f, "Device"),
            LogCategory::Middleware => write!(f, "Middleware"),
            LogCategory::App => write!(f, "App"),
            LogCategory::Door => write!(f, "Door"),
        }
    }
}

/// User name carried by a scan (2-40 ASCII characters).
///
/// Names are normalized (trimmed and uppercased) on construction, matching
/// how the roster stores them, so enrollment checks never depend on the
/// casing of the scanned input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a new user name with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUserName` if the trimmed name is outside the
    /// 2-40 character range or contains non-ASCII characters.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim().to_uppercase();

        let len = name.len();
        if !(MIN_USER_NAME_LENGTH..=MAX_USER_NAME_LENGTH).contains(&len) {
            return Err(Error::InvalidUserName(format!(
                "name must be {MIN_USER_NAME_LENGTH}-{MAX_USER_NAME_LENGTH} chars, got {len}"
            )));
        }

        if !name.is_ascii() {
            return Err(Error::InvalidUserName("name must be ASCII".to_string()));
        }

        Ok(UserName(name))
    }

    /// Get the normalized name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UserName::new(s)
    }
}

/// Why a scan was denied.
///
/// Denials are expected domain outcomes, not errors: the flow still logs
/// them and resets the system to baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// A student scanned while no class session was active.
    NoActiveSession,
    /// The student is not on the active session's roster.
    NotEnrolled,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DenialReason::NoActiveSession => write!(f, "no active session"),
            DenialReason::NotEnrolled => write!(f, "not enrolled"),
        }
    }
}

/// Final result of a completed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The door was commanded open for this user.
    Granted,
    /// Access was denied; the door never opened.
    Denied(DenialReason),
}

impl ScanOutcome {
    /// Returns `true` if the scan ended with the door being opened.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, ScanOutcome::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MOHAMMED", "MOHAMMED")]
    #[case("  rachid ", "RACHID")]
    #[case("sara", "SARA")]
    fn test_user_name_valid(#[case] input: &str, #[case] expected: &str) {
        let name = UserName::new(input).unwrap();
        assert_eq!(name.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("a")] // too short
    #[case("   ")] // whitespace only
    #[case("Renée")] // non-ASCII
    fn test_user_name_invalid(#[case] input: &str) {
        assert!(UserName::new(input).is_err());
    }

    #[test]
    fn test_user_name_too_long() {
        let long = "A".repeat(MAX_USER_NAME_LENGTH + 1);
        assert!(UserName::new(&long).is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("security".parse::<UserRole>().unwrap(), UserRole::Security);
        assert_eq!("Teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert_eq!(" STUDENT ".parse::<UserRole>().unwrap(), UserRole::Student);
        assert!("janitor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(ActiveProtocol::None.to_string(), "none");
        assert_eq!(ActiveProtocol::Tcp.to_string(), "TCP");
        assert_eq!(ActiveProtocol::Http.to_string(), "HTTP");
    }

    #[test]
    fn test_protocol_default_is_none() {
        assert_eq!(ActiveProtocol::default(), ActiveProtocol::None);
    }

    #[test]
    fn test_outcome_is_granted() {
        assert!(ScanOutcome::Granted.is_granted());
        assert!(!ScanOutcome::Denied(DenialReason::NotEnrolled).is_granted());
    }

    #[test]
    fn test_category_serialization() {
        let serialized = serde_json::to_string(&LogCategory::Middleware).unwrap();
        assert_eq!(serialized, "\"middleware\"");

        let deserialized: LogCategory = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, LogCategory::Middleware);
    }
}
