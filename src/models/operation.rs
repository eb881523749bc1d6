//! Service operations

use serde::{Deserialize, Serialize};

/// An operation understood by the Descil service
///
/// Serialized as its name in the `Operation` field of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Connectivity check
    HelloWorld,
    /// Reserved by the service
    GetRequest,
    /// Reserved by the service
    GetResponse,
    /// Mark a worker's session as started
    CheckIn,
    /// Mark a worker's session as completed
    CheckOut,
    /// Mark a worker's session as abandoned
    DropOut,
    /// Fetch the project's access codes
    GetCodes,
    /// Post a batch of session results
    PostCodes,
    /// Fetch payoff records
    GetPayoffs,
    /// Post payoff records
    PostPayoffs,
}

impl Operation {
    /// Every operation, in the service's order
    pub const ALL: [Self; 10] = [
        Self::HelloWorld,
        Self::GetRequest,
        Self::GetResponse,
        Self::CheckIn,
        Self::CheckOut,
        Self::DropOut,
        Self::GetCodes,
        Self::PostCodes,
        Self::GetPayoffs,
        Self::PostPayoffs,
    ];

    /// Wire name of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HelloWorld => "HelloWorld",
            Self::GetRequest => "GetRequest",
            Self::GetResponse => "GetResponse",
            Self::CheckIn => "CheckIn",
            Self::CheckOut => "CheckOut",
            Self::DropOut => "DropOut",
            Self::GetCodes => "GetCodes",
            Self::PostCodes => "PostCodes",
            Self::GetPayoffs => "GetPayoffs",
            Self::PostPayoffs => "PostPayoffs",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown operation: {s}"))
    }
}
