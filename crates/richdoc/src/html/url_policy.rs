// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Which URLs may appear in exported and sanitized markup.

use url::{ParseError, Url};

/// Where a URL is going to be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlUse {
    /// `a[href]`: relative, `http(s)` or `mailto`.
    Link,
    /// `img[src]`, `video[src]`: relative or `http(s)`.
    Media,
    /// `iframe[src]`: absolute `http(s)` only.
    Frame,
}

/// Parse `raw` for `usage`. Returns the absolute URL when there is one.
fn classify(raw: &str, usage: UrlUse) -> Result<Option<Url>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
        return Err(());
    }
    match Url::parse(trimmed) {
        Ok(url) => {
            let allowed = match url.scheme() {
                "http" | "https" => true,
                "mailto" => usage == UrlUse::Link,
                _ => false,
            };
            if allowed {
                Ok(Some(url))
            } else {
                Err(())
            }
        }
        Err(ParseError::RelativeUrlWithoutBase) if usage != UrlUse::Frame => {
            Ok(None)
        }
        Err(_) => Err(()),
    }
}

pub fn is_safe_url(raw: &str, usage: UrlUse) -> bool {
    classify(raw, usage).is_ok()
}

/// Frame sources must be absolute and, when `hosts` is given, served from
/// one of them or a subdomain.
pub fn is_allowed_frame(raw: &str, hosts: Option<&[String]>) -> bool {
    let Ok(Some(url)) = classify(raw, UrlUse::Frame) else {
        return false;
    };
    let Some(hosts) = hosts else {
        return true;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    hosts.iter().any(|allowed| {
        let allowed = allowed.trim_start_matches('.');
        host.eq_ignore_ascii_case(allowed)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", allowed.to_ascii_lowercase()))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn script_urls_are_never_safe() {
        for url in [
            "javascript:alert(1)",
            " JavaScript:alert(1)",
            "java\tscript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "vbscript:msgbox",
        ] {
            assert!(!is_safe_url(url, UrlUse::Link), "{url}");
            assert!(!is_safe_url(url, UrlUse::Media), "{url}");
            assert!(!is_safe_url(url, UrlUse::Frame), "{url}");
        }
    }

    #[test]
    fn relative_urls_are_fine_outside_frames() {
        assert!(is_safe_url("/uploads/a.mp4", UrlUse::Media));
        assert!(is_safe_url("#section", UrlUse::Link));
        assert!(!is_safe_url("/embed/1", UrlUse::Frame));
    }

    #[test]
    fn mailto_is_only_for_links() {
        assert!(is_safe_url("mailto:a@example.com", UrlUse::Link));
        assert!(!is_safe_url("mailto:a@example.com", UrlUse::Media));
    }

    #[test]
    fn frame_hosts_match_subdomains() {
        let hosts = vec!["youtube-nocookie.com".to_owned()];
        assert!(is_allowed_frame(
            "https://www.youtube-nocookie.com/embed/x",
            Some(&hosts)
        ));
        assert!(!is_allowed_frame("https://evil.com/embed/x", Some(&hosts)));
        assert!(!is_allowed_frame(
            "https://notyoutube-nocookie.com/x",
            Some(&hosts)
        ));
        assert!(is_allowed_frame("https://evil.com/embed/x", None));
    }
}
