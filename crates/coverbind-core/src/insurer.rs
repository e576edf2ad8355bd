//! Insurer codes and authoritative document types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Insurers whose policy documents can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Insurer {
    Samsung,
    Meritz,
    Lotte,
    Kb,
    Db,
    Hanwha,
    Heungkuk,
    Hyundai,
}

impl Insurer {
    pub const ALL: [Insurer; 8] = [
        Self::Samsung,
        Self::Meritz,
        Self::Lotte,
        Self::Kb,
        Self::Db,
        Self::Hanwha,
        Self::Heungkuk,
        Self::Hyundai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Samsung => "SAMSUNG",
            Self::Meritz => "MERITZ",
            Self::Lotte => "LOTTE",
            Self::Kb => "KB",
            Self::Db => "DB",
            Self::Hanwha => "HANWHA",
            Self::Heungkuk => "HEUNGKUK",
            Self::Hyundai => "HYUNDAI",
        }
    }
}

impl fmt::Display for Insurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Insurer {
    type Err = ModelError;

    /// Case-insensitive match on the insurer code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == upper)
            .ok_or_else(|| ModelError::UnknownInsurer(s.to_string()))
    }
}

/// Authoritative document kinds.
///
/// Only the policy terms (약관) and the operating-method statement (사업방법서)
/// are trusted as evidence. Summaries and marketing material never reach the
/// comparison pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    /// Policy terms. Primary source.
    #[serde(rename = "약관")]
    Yakgwan,
    /// Operating-method statement. Secondary source.
    #[serde(rename = "사업방법서")]
    Saeop,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yakgwan => "약관",
            Self::Saeop => "사업방법서",
        }
    }

    /// Rank used for evidence selection. Lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Yakgwan => 0,
            Self::Saeop => 1,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = ModelError;

    /// Accepts the Korean label or its romanised alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "약관" => Ok(Self::Yakgwan),
            "사업방법서" => Ok(Self::Saeop),
            other => match other.to_ascii_lowercase().as_str() {
                "yakgwan" => Ok(Self::Yakgwan),
                "saeop" => Ok(Self::Saeop),
                _ => Err(ModelError::UnknownDocType(s.to_string())),
            },
        }
    }
}
