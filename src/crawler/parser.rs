//! HTML and text helpers shared by the source adapters
//!
//! This module holds the layout-independent pieces of extraction:
//! - Link resolution against a site root
//! - Text flattening in the two shapes adapters need
//! - Regex fallbacks for phone, email and CNPJ patterns
//! - Cloudflare email de-obfuscation
//! - Slug and name normalization
//!
//! Nothing here assumes a particular site's markup; selectors live in the
//! adapters.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?\d{2}\)?\s?\d{4,5}-?\d{4}").expect("valid phone pattern"));

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email pattern")
});

static CNPJ_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").expect("valid CNPJ pattern"));

static STATE_REGISTRATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:I\.?E\.?|Inscrição\s*Estadual)[:\s]*([A-Za-z0-9./-]+|isento)")
        .expect("valid state registration pattern")
});

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("valid body selector"));

/// Parses a selector that is known at compile time
///
/// Adapters keep their selectors in `Lazy` statics built with this.
pub fn selector(css: &str) -> Selector {
    match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => panic!("invalid built-in selector {:?}: {:?}", css, e),
    }
}

/// Resolves an href against the site root
///
/// Returns None for empty hrefs, fragment-only links, non-HTTP schemes and
/// anything that fails to parse.
pub fn resolve_link(base_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Flattens an element's text, trimming every text node and dropping empty ones
///
/// `separator` goes between the surviving pieces; `""` glues them together.
pub fn stripped_text(element: &ElementRef, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Text of the first element matching `selector`, if it has any
pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| stripped_text(&element, ""))
        .filter(|text| !text.is_empty())
}

/// Value of `attr` on the first element matching `selector`
pub fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
}

/// All visible text of the page, pieces separated by a single space
pub fn page_text(document: &Html) -> String {
    match document.select(&BODY_SELECTOR).next() {
        Some(body) => stripped_text(&body, " "),
        None => stripped_text(&document.root_element(), " "),
    }
}

/// First phone-number-shaped substring
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_PATTERN
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

/// First email-shaped substring
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// First CNPJ-shaped substring (`00.000.000/0000-00`)
pub fn find_cnpj(text: &str) -> Option<String> {
    CNPJ_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// State registration value following an "I.E." or "Inscrição Estadual" label
pub fn find_state_registration(text: &str) -> Option<String> {
    STATE_REGISTRATION_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Decodes a Cloudflare-obfuscated email (`data-cfemail`)
///
/// The first hex pair is the key; every following pair is one character XORed
/// with it. Any malformed input yields `None`.
///
/// # Example
///
/// ```
/// use carrier_scout::crawler::decode_cf_email;
///
/// assert_eq!(decode_cf_email("4223232302"), Some("aaa@".to_string()));
/// assert_eq!(decode_cf_email("zz"), None);
/// ```
pub fn decode_cf_email(encoded: &str) -> Option<String> {
    let encoded = encoded.trim();
    if encoded.len() < 4 || encoded.len() % 2 != 0 || !encoded.is_ascii() {
        return None;
    }

    let key = u8::from_str_radix(&encoded[..2], 16).ok()?;
    let mut decoded = String::with_capacity(encoded.len() / 2 - 1);
    for i in (2..encoded.len()).step_by(2) {
        let byte = u8::from_str_radix(&encoded[i..i + 2], 16).ok()?;
        decoded.push(char::from(byte ^ key));
    }

    Some(decoded)
}

/// Capitalizes the first letter of every word and lowercases the rest
///
/// A word starts after any non-alphabetic character, so "sao-paulo" becomes
/// "Sao-Paulo".
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

/// Turns a URL slug fragment like `sao-paulo` into `Sao Paulo`
pub fn slug_to_place(slug: &str) -> Option<String> {
    let place = title_case(&slug.replace('-', " "));
    let place = place.trim();
    (!place.is_empty()).then(|| place.to_string())
}

/// First element after `anchor` in document order that matches `selector`
///
/// Elements nested inside `anchor` count as following it.
pub fn next_matching<'a>(
    document: &'a Html,
    anchor: &ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| selector.matches(element))
}

/// Value of `attr` on the closest ancestor `tag` element that carries it
pub fn ancestor_attr(element: &ElementRef, tag: &str, attr: &str) -> Option<String> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|ancestor| ancestor.value().name() == tag)
        .find_map(|ancestor| ancestor.value().attr(attr))
        .map(|value| value.trim().to_string())
}

/// Whether `link` points back into the site rooted at `base_url`
pub fn is_same_site(base_url: &Url, link: &str) -> bool {
    match (base_url.host_str(), Url::parse(link)) {
        (Some(base_host), Ok(url)) => url
            .host_str()
            .map(|host| host.trim_start_matches("www.") == base_host.trim_start_matches("www."))
            .unwrap_or(false),
        _ => false,
    }
}
