//! Shared types used across orgmaps.
//!
//! This module defines the listing identifier newtype and the record emitted
//! for every parsed organization card.

use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for listing identifiers.
///
/// A listing id is the opaque `data-id` key the map application assigns to a
/// search result. It is stable across re-renders of the same listing within
/// one search session. Ids must be non-empty and contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(String);

impl ListingId {
    /// Create a new `ListingId` from a string.
    ///
    /// # Errors
    /// Returns error if the id is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        static ID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ID_REGEX.get_or_init(|| Regex::new(r"^\S+$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "invalid listing ID: must be non-empty without whitespace, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Verification badge shown on an organization card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationTier {
    /// No badge
    #[default]
    None,
    /// Regular verified-owner badge
    Basic,
    /// Prioritized (paid placement) badge
    Prioritized,
}

impl VerificationTier {
    /// Human-readable label, empty for [`VerificationTier::None`].
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Basic => "basic",
            Self::Prioritized => "prioritized",
        }
    }
}

impl fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One organization parsed from a detail panel.
///
/// String fields are empty when the card does not carry the value or when the
/// scraped text does not normalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Organization display name
    pub name: String,
    /// Phone in `+7XXXXXXXXXX` form
    pub phone: String,
    /// Verification badge tier
    pub verified: VerificationTier,
    /// Award ribbon text
    pub award: String,
    /// First VK link on the card
    pub vk: String,
    /// First Telegram link on the card
    pub telegram: String,
    /// First WhatsApp link on the card
    pub whatsapp: String,
    /// Organization website
    pub website: String,
    /// Canonical detail-page URL
    pub card_url: String,
    /// Average rating as a decimal string
    pub rating: String,
    /// Number of ratings as an integer string
    pub rating_count: String,
}
