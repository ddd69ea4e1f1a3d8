//! Detail panel parsing.
//!
//! The collector hands over the panel's HTML snapshot; [`CardParser`] reads it
//! through [`CardDocument`], whose probes return empty values instead of
//! failing.

use crate::normalize::{
    canonical_card_url, classify_social, normalize_count, normalize_link, normalize_phone,
    normalize_rating, normalize_website, sanitize_text, SocialKind,
};
use orgmaps_core::{ListingId, OrganizationRecord, VerificationTier};
use scraper::{Html, Selector};

const TITLE_LINK: &str = "h1.card-title-view__title a.card-title-view__title-link";
const TITLE: &str = "h1.card-title-view__title";
const RATING: &str = ".business-rating-badge-view__rating-text";
const RATING_COUNT: &str = ".business-header-rating-view__text";
const PHONE: &str = "span[itemprop='telephone']";
const BADGE_PRIORITIZED: &str = "span.business-verified-badge._prioritized";
const BADGE: &str = "span.business-verified-badge";
const AWARD: &str = ".business-header-awards-view__award-text";
const ANY_LINK: &str = "a[href]";
const WEBSITE_LINK: &str = "a.business-urls-view__link[href]";
const WEBSITE_TEXT: &str = ".business-urls-view__text";

/// Best-effort query capability over one detail panel snapshot.
pub struct CardDocument {
    html: Html,
}

impl CardDocument {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// Sanitized text of the first match, or empty.
    #[must_use]
    pub fn query_text(&self, selector: &str) -> String {
        Selector::parse(selector)
            .ok()
            .and_then(|s| {
                self.html
                    .select(&s)
                    .next()
                    .map(|el| sanitize_text(&el.text().collect::<String>()))
            })
            .unwrap_or_default()
    }

    /// Sanitized attribute of the first match, or empty.
    #[must_use]
    pub fn query_attr(&self, selector: &str, name: &str) -> String {
        Selector::parse(selector)
            .ok()
            .and_then(|s| {
                self.html
                    .select(&s)
                    .next()
                    .and_then(|el| el.value().attr(name))
                    .map(sanitize_text)
            })
            .unwrap_or_default()
    }

    /// The attribute of every match, in document order.
    #[must_use]
    pub fn query_attr_all(&self, selector: &str, name: &str) -> Vec<String> {
        Selector::parse(selector)
            .map(|s| {
                self.html
                    .select(&s)
                    .filter_map(|el| el.value().attr(name))
                    .map(sanitize_text)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn exists(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|s| self.html.select(&s).next().is_some())
            .unwrap_or(false)
    }
}

/// Social links found on a card, first match per network.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SocialLinks {
    pub vk: String,
    pub telegram: String,
    pub whatsapp: String,
}

impl SocialLinks {
    /// Scan hrefs in order, keeping the first link for each network.
    pub fn collect<'a, I>(hrefs: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut links = Self::default();
        for href in hrefs {
            let Some(kind) = classify_social(href) else {
                continue;
            };
            let slot = match kind {
                SocialKind::Vk => &mut links.vk,
                SocialKind::Telegram => &mut links.telegram,
                SocialKind::WhatsApp => &mut links.whatsapp,
            };
            if slot.is_empty() {
                *slot = normalize_link(href).unwrap_or_default();
            }
        }
        links
    }
}

/// Turns detail panel HTML into an [`OrganizationRecord`].
#[derive(Debug, Clone)]
pub struct CardParser {
    host: String,
}

impl CardParser {
    /// `host` is used to build canonical detail URLs (e.g. `yandex.ru`).
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    #[must_use]
    pub fn parse(&self, html: &str, id: Option<&ListingId>) -> OrganizationRecord {
        let card = CardDocument::parse(html);

        let mut name = card.query_text(TITLE_LINK);
        if name.is_empty() {
            name = card.query_text(TITLE);
        }
        let href = card.query_attr(TITLE_LINK, "href");

        let hrefs = card.query_attr_all(ANY_LINK, "href");
        let social = SocialLinks::collect(hrefs.iter().map(String::as_str));

        OrganizationRecord {
            name,
            phone: normalize_phone(&card.query_text(PHONE)),
            verified: Self::verification(&card),
            award: card.query_text(AWARD),
            vk: social.vk,
            telegram: social.telegram,
            whatsapp: social.whatsapp,
            website: Self::website(&card),
            card_url: canonical_card_url(&self.host, &href, id),
            rating: normalize_rating(&card.query_text(RATING)),
            rating_count: normalize_count(&card.query_text(RATING_COUNT)),
        }
    }

    fn verification(card: &CardDocument) -> VerificationTier {
        if card.exists(BADGE_PRIORITIZED) {
            VerificationTier::Prioritized
        } else if card.exists(BADGE) {
            VerificationTier::Basic
        } else {
            VerificationTier::None
        }
    }

    fn website(card: &CardDocument) -> String {
        let link = card.query_attr(WEBSITE_LINK, "href");
        if link.is_empty() {
            normalize_website(&card.query_text(WEBSITE_TEXT))
        } else {
            normalize_website(&link)
        }
    }
}
