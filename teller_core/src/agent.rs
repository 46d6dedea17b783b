//! Agent directory: which backend persona produced a reply and how to show it.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Backend persona that answered a message.
///
/// Parsing is total: anything the client does not recognise becomes
/// [`AgentTag::Unknown`], so an agent-origin message always has a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum AgentTag {
    Coordinator,
    CardOperations,
    Loan,
    Support,
    Unknown,
}

impl AgentTag {
    /// Loose match over the tags the server is known to emit.
    ///
    /// Accepts both `card_operations_agent` and the bare route name
    /// `card_operations`, ignoring case, surrounding whitespace and `-`/`_`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase().replace('-', "_");
        let key = key.strip_suffix("_agent").unwrap_or(&key);
        match key {
            "coordinator" => Self::Coordinator,
            "card_operations" => Self::CardOperations,
            "loan" => Self::Loan,
            "support" => Self::Support,
            _ => {
                debug!("Unrecognised agent tag {raw:?}, using fallback descriptor");
                Self::Unknown
            }
        }
    }

    /// Canonical wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator_agent",
            Self::CardOperations => "card_operations_agent",
            Self::Loan => "loan_agent",
            Self::Support => "support_agent",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for AgentTag {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl Serialize for AgentTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for AgentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentIcon {
    Support,
    CreditCard,
    AccountBalance,
    SmartToy,
}

impl AgentIcon {
    /// Single-glyph stand-in for terminals.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Support => "🎧",
            Self::CreditCard => "💳",
            Self::AccountBalance => "🏦",
            Self::SmartToy => "🤖",
        }
    }
}

/// Palette slot an agent is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentColor {
    Primary,
    Success,
    Warning,
    Info,
    Secondary,
}

impl AgentColor {
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Primary => (0x19, 0x76, 0xd2),
            Self::Success => (0x2e, 0x7d, 0x32),
            Self::Warning => (0xed, 0x6c, 0x02),
            Self::Info => (0x02, 0x88, 0xd1),
            Self::Secondary => (0xdc, 0x00, 0x4e),
        }
    }

    #[must_use]
    pub fn hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub display_name: &'static str,
    pub icon: AgentIcon,
    pub color: AgentColor,
}

const FALLBACK: AgentDescriptor = AgentDescriptor {
    display_name: "TBC Assistant",
    icon: AgentIcon::SmartToy,
    color: AgentColor::Secondary,
};

/// Display metadata for an agent. Never fails.
#[must_use]
pub const fn describe(tag: AgentTag) -> AgentDescriptor {
    match tag {
        AgentTag::Coordinator => AgentDescriptor {
            display_name: "Coordinator",
            icon: AgentIcon::Support,
            color: AgentColor::Primary,
        },
        AgentTag::CardOperations => AgentDescriptor {
            display_name: "Card Operations",
            icon: AgentIcon::CreditCard,
            color: AgentColor::Success,
        },
        AgentTag::Loan => AgentDescriptor {
            display_name: "Loan Specialist",
            icon: AgentIcon::AccountBalance,
            color: AgentColor::Warning,
        },
        AgentTag::Support => AgentDescriptor {
            display_name: "Support",
            icon: AgentIcon::SmartToy,
            color: AgentColor::Info,
        },
        AgentTag::Unknown => FALLBACK,
    }
}
