// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ItunesError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref APP_STORE_URL_REGEX: Regex =
        Regex::new(r"^https://apps\.apple\.com/([a-z]{2})/.*?/id(\d+)")
            .expect("valid App Store URL regex");
}

/// Track ID and storefront parsed from an App Store URL such as
/// `https://apps.apple.com/us/app/pages/id361309726`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStoreUrl {
    pub url: String,
    pub track_id: i64,
    pub country: String,
}

impl AppStoreUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || {
            ItunesError::InvalidInput(format!(
                "invalid App Store URL {url:?}: expected \
                 https://apps.apple.com/{{country}}/app/{{name}}/id{{id}}"
            ))
        };

        let captures = APP_STORE_URL_REGEX.captures(url).ok_or_else(invalid)?;
        let track_id = captures[2].parse().map_err(|_| invalid())?;

        Ok(Self {
            url: url.to_string(),
            track_id,
            country: captures[1].to_string(),
        })
    }
}

/// Parse every URL and require that they all belong to the same storefront.
///
/// Returns the parsed URLs (input order) and the shared country code.
pub fn parse_same_country(urls: &[String]) -> Result<(Vec<AppStoreUrl>, String)> {
    let parsed = urls
        .iter()
        .map(|url| AppStoreUrl::parse(url))
        .collect::<Result<Vec<_>>>()?;

    let country = match parsed.first() {
        Some(first) => first.country.clone(),
        None => {
            return Err(ItunesError::InvalidInput(
                "lookup requires at least one App Store URL".to_string(),
            ))
        }
    };

    if parsed.iter().any(|p| p.country != country) {
        return Err(ItunesError::InvalidInput(
            "all App Store URLs must be from the same country store".to_string(),
        ));
    }

    Ok((parsed, country))
}
