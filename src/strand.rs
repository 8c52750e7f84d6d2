//! Strand orientation of transcripts.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Strand a transcript is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Ensembl encodes strand as +1 / -1.
    pub fn from_sign(sign: i8) -> Result<Self, Error> {
        match sign {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Reverse),
            _ => Err(Error::Parse(format!("invalid strand: {sign}"))),
        }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }

    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

impl FromStr for Strand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" | "1" | "+1" => Ok(Self::Forward),
            "-" | "-1" => Ok(Self::Reverse),
            other => Err(Error::Parse(format!("invalid strand: '{other}'"))),
        }
    }
}

impl TryFrom<String> for Strand {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}
