use crate::error::{Result, ScrapeError};

/// Build the search results URL for `query`.
///
/// The query is percent-encoded into the `text` parameter of `base_url`.
pub fn build_search_url(base_url: &str, query: &str) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ScrapeError::EmptyQuery);
    }

    let base = url::Url::parse(base_url)?;
    let separator = if base.query().is_some() { '&' } else { '?' };
    Ok(format!(
        "{}{}text={}",
        base.as_str(),
        separator,
        urlencoding::encode(query)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_query() {
        let url = build_search_url("https://yandex.ru/web-maps/", "кофейня в Казани")
            .expect("should build search URL");
        assert!(url.starts_with("https://yandex.ru/web-maps/?text="));
        assert!(url.ends_with("%20%D0%B2%20%D0%9A%D0%B0%D0%B7%D0%B0%D0%BD%D0%B8"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_build_url_keeps_existing_params() {
        let url = build_search_url("https://yandex.ru/web-maps/?ll=37.6,55.7", "cafe")
            .expect("should build search URL");
        assert_eq!(url, "https://yandex.ru/web-maps/?ll=37.6,55.7&text=cafe");
    }

    #[test]
    fn test_build_url_rejects_empty_query() {
        assert!(matches!(
            build_search_url("https://yandex.ru/web-maps/", "   "),
            Err(ScrapeError::EmptyQuery)
        ));
    }

    #[test]
    fn test_build_url_rejects_bad_base() {
        assert!(matches!(
            build_search_url("not a url", "cafe"),
            Err(ScrapeError::InvalidUrl(_))
        ));
    }
}
