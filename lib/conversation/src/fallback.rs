//! Fixed replies for turns that cannot produce a genuine answer.

use crate::error::CapabilityError;
use std::fmt;

/// A failure kind with a fixed, user-facing reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallback {
    /// The model asked for a capability that does not exist.
    CapabilityUnavailable,
    /// The model's arguments could not be validated.
    InvalidArguments,
    /// A capability could not read its data.
    ServiceUnavailable,
    /// The model could not be reached.
    GatewayUnavailable,
    /// The conversation could not be loaded or saved.
    StoreUnavailable,
}

impl Fallback {
    /// Returns the reply shown to the user.
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::CapabilityUnavailable => {
                "Sorry, I can't help with that: the requested service is not available."
            }
            Self::InvalidArguments => {
                "Sorry, I couldn't understand the details of your request. Could you rephrase it, including the city or route you have in mind?"
            }
            Self::ServiceUnavailable => {
                "Sorry, this service is temporarily unavailable. Please try again later."
            }
            Self::GatewayUnavailable => {
                "Sorry, I'm unable to answer right now. Please try again in a moment."
            }
            Self::StoreUnavailable => {
                "Sorry, something went wrong while saving our conversation. Please try again in a moment."
            }
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<&CapabilityError> for Fallback {
    fn from(error: &CapabilityError) -> Self {
        match error {
            CapabilityError::UnknownCapability { .. } => Self::CapabilityUnavailable,
            CapabilityError::MalformedArguments { .. } | CapabilityError::MissingParameter { .. } => {
                Self::InvalidArguments
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fallback_is_distinct_and_non_empty() {
        let all = [
            Fallback::CapabilityUnavailable,
            Fallback::InvalidArguments,
            Fallback::ServiceUnavailable,
            Fallback::GatewayUnavailable,
            Fallback::StoreUnavailable,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(!a.text().trim().is_empty());
            for b in &all[i + 1..] {
                assert_ne!(a.text(), b.text());
            }
        }
    }

    #[test]
    fn capability_errors_map_to_fallbacks() {
        let unknown = CapabilityError::UnknownCapability {
            name: "book_flight".to_string(),
        };
        assert_eq!(Fallback::from(&unknown), Fallback::CapabilityUnavailable);

        let missing = CapabilityError::MissingParameter {
            capability: "get_hotels_info".to_string(),
            parameter: "city".to_string(),
        };
        assert_eq!(Fallback::from(&missing), Fallback::InvalidArguments);
    }
}
