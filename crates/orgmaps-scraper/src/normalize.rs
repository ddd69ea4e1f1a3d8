//! Normalizers turning raw DOM text and attributes into record fields.
//!
//! Every function here is total: text that does not fit the field's grammar
//! normalizes to an empty string.

use orgmaps_core::ListingId;
use regex::Regex;
use std::sync::OnceLock;

/// Social network a link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialKind {
    Vk,
    Telegram,
    WhatsApp,
}

impl SocialKind {
    fn domains(self) -> &'static [&'static str] {
        match self {
            Self::Vk => &["vk.com", "vk.ru"],
            Self::Telegram => &["t.me", "telegram.me"],
            Self::WhatsApp => &["wa.me", "api.whatsapp.com", "whatsapp.com"],
        }
    }
}

/// Collapse whitespace runs (including NBSP) into single spaces and trim.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a Russian phone number to `+7XXXXXXXXXX`.
///
/// Only 11-digit numbers starting with 7 or 8 are accepted; a leading 8 is
/// rewritten to 7.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 11 {
        return String::new();
    }
    match digits.as_bytes()[0] {
        b'7' => format!("+{digits}"),
        b'8' => format!("+7{}", &digits[1..]),
        _ => String::new(),
    }
}

/// First decimal number in the text, with `.` as the separator.
#[must_use]
pub fn normalize_rating(raw: &str) -> String {
    static RATING_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = RATING_REGEX.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid regex"));

    regex
        .find(raw)
        .map(|m| m.as_str().replace(',', "."))
        .unwrap_or_default()
}

/// First integer in the text, tolerating digit-group spaces ("1 234 оценки").
#[must_use]
pub fn normalize_count(raw: &str) -> String {
    static COUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COUNT_REGEX
        .get_or_init(|| Regex::new(r"\d+(?:[ \u{00a0}\u{202f}]\d{3})*").expect("valid regex"));

    regex
        .find(raw)
        .map(|m| m.as_str().chars().filter(char::is_ascii_digit).collect())
        .unwrap_or_default()
}

/// Make a website reference absolute.
///
/// Absolute `http(s)` URLs are kept, protocol-relative ones get `https:`,
/// bare domains get `https://`.
#[must_use]
pub fn normalize_website(raw: &str) -> String {
    let url = sanitize_text(raw);
    if url.is_empty() {
        return url;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else if url.starts_with("//") {
        format!("https:{url}")
    } else {
        format!("https://{url}")
    }
}

/// Canonical detail-page URL of an organization.
///
/// A known listing id always wins over the scraped href. Without an id the
/// numeric organization id is pulled out of the href; if there is none the
/// result is empty.
#[must_use]
pub fn canonical_card_url(host: &str, href: &str, id: Option<&ListingId>) -> String {
    if let Some(id) = id {
        return format!("https://{host}/maps/org/{id}/");
    }

    let href = sanitize_text(href);
    if href.is_empty() {
        return String::new();
    }

    let absolute = if href.starts_with("http") {
        href
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        format!("https://{host}{href}")
    };

    static ORG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ORG_REGEX
        .get_or_init(|| Regex::new(r"/maps/org/(?:[^/]+/)?(\d+)/?").expect("valid regex"));

    regex
        .captures(&absolute)
        .and_then(|caps| caps.get(1))
        .map(|org_id| format!("https://{host}/maps/org/{}/", org_id.as_str()))
        .unwrap_or_default()
}

/// Classify a link by the social network its host belongs to.
#[must_use]
pub fn classify_social(href: &str) -> Option<SocialKind> {
    let href = normalize_link(href)?;
    let parsed = url::Url::parse(&href).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    [SocialKind::Vk, SocialKind::Telegram, SocialKind::WhatsApp]
        .into_iter()
        .find(|kind| {
            kind.domains()
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        })
}

/// Sanitize an href and give protocol-relative links a scheme.
#[must_use]
pub fn normalize_link(href: &str) -> Option<String> {
    let href = sanitize_text(href);
    if href.is_empty() {
        None
    } else if href.starts_with("//") {
        Some(format!("https:{href}"))
    } else {
        Some(href)
    }
}
