//! Registry region resolution
//!
//! Maps an image reference to the IBM Cloud Container Registry region it
//! lives in. An explicitly supplied region always wins; otherwise the
//! registry host (the part of the reference before the first `/`) is looked
//! up in a fixed host table. An unmapped host without an explicit region is
//! an error, never a silent default.

use crate::error::{Error, Result};
use std::fmt;

/// Fixed mapping of public registry hosts to region codes.
const REGION_TABLE: &[(&str, &str)] = &[
    ("icr.io", "global"),
    ("us.icr.io", "us-south"),
    ("eu.icr.io", "eu-gb"),
    ("uk.icr.io", "uk-south"),
    ("de.icr.io", "eu-de"),
    ("es.icr.io", "eu-es"),
    ("au.icr.io", "au-syd"),
    ("jp.icr.io", "jp-tok"),
    ("jp2.icr.io", "jp-osa"),
    ("ca.icr.io", "ca-tor"),
    ("br.icr.io", "br-sao"),
];

/// How a region code was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Explicit,
    Inferred,
}

impl fmt::Display for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSource::Explicit => write!(f, "explicit"),
            RegionSource::Inferred => write!(f, "inferred"),
        }
    }
}

/// A region code together with how it was determined. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub code: String,
    pub source: RegionSource,
}

/// Resolve the region for `image`.
///
/// A non-empty `explicit` region is returned as-is without checking it
/// against the image host. Otherwise the host is matched against the fixed
/// table; unknown hosts fail with [`Error::RegionUnresolved`].
pub fn resolve(image: &str, explicit: Option<&str>) -> Result<ResolvedRegion> {
    if let Some(region) = explicit {
        if !region.is_empty() {
            return Ok(ResolvedRegion {
                code: region.to_string(),
                source: RegionSource::Explicit,
            });
        }
    }

    let host = image.split('/').next().unwrap_or(image);
    REGION_TABLE
        .iter()
        .find(|(h, _)| *h == host)
        .map(|(_, code)| ResolvedRegion {
            code: (*code).to_string(),
            source: RegionSource::Inferred,
        })
        .ok_or_else(|| Error::RegionUnresolved(image.to_string()))
}

/// Registry host serving a region code, if the code is a known region.
pub fn registry_host(code: &str) -> Option<&'static str> {
    REGION_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(host, _)| *host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_region_from_known_hosts() {
        for (host, code) in [
            ("us.icr.io", "us-south"),
            ("eu.icr.io", "eu-gb"),
            ("uk.icr.io", "uk-south"),
            ("au.icr.io", "au-syd"),
            ("jp.icr.io", "jp-tok"),
            ("de.icr.io", "eu-de"),
        ] {
            let image = format!("{}/ns/app:latest", host);
            let resolved = resolve(&image, None).unwrap();
            assert_eq!(resolved.code, code);
            assert_eq!(resolved.source, RegionSource::Inferred);
        }
    }

    #[test]
    fn explicit_region_wins_over_inference() {
        let resolved = resolve("us.icr.io/ns/img", Some("eu-gb")).unwrap();
        assert_eq!(resolved.code, "eu-gb");
        assert_eq!(resolved.source, RegionSource::Explicit);
    }

    #[test]
    fn empty_explicit_region_falls_back_to_inference() {
        let resolved = resolve("jp.icr.io/ns/img:1", Some("")).unwrap();
        assert_eq!(resolved.code, "jp-tok");
        assert_eq!(resolved.source, RegionSource::Inferred);
    }

    #[test]
    fn unknown_host_without_explicit_region_fails() {
        let err = resolve("registry.example.com/ns/img", None).unwrap_err();
        assert!(matches!(err, Error::RegionUnresolved(_)));
    }

    #[test]
    fn host_lookup_by_region_code() {
        assert_eq!(registry_host("us-south"), Some("us.icr.io"));
        assert_eq!(registry_host("nowhere"), None);
    }
}
