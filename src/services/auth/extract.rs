/*
 * Responsibility
 * - Locate the candidate token for one request (cookie phase, then header phase)
 * - No validation here: the result is an opaque string or nothing
 */
use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;

use crate::services::auth::policy::{CookieSource, HeaderSource, Policy};
use crate::services::cookie::CookieUnsigner;

/// Per-request credential carriers, read-only.
#[derive(Debug, Clone, Default)]
pub struct RawCredentialSource<'a> {
    /// `None` when the request carried no `Cookie` header at all.
    pub cookies: Option<CookieJar>,
    pub authorization: Option<&'a str>,
}

impl<'a> RawCredentialSource<'a> {
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        let cookies = headers
            .contains_key(header::COOKIE)
            .then(|| CookieJar::from_headers(headers));

        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        Self {
            cookies,
            authorization,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CookieLookup {
    Absent,
    Found(String),
    // Present but the signature did not verify
    Rejected,
}

/// Apply `policy` to `source`. Cookie wins over header; a rejected signed cookie
/// does not fall back to the header.
pub fn extract_token(
    policy: &Policy,
    source: &RawCredentialSource<'_>,
    unsigner: Option<&dyn CookieUnsigner>,
) -> Option<String> {
    match lookup_cookie(policy, source, unsigner) {
        CookieLookup::Found(token) => Some(token),
        CookieLookup::Rejected => None,
        CookieLookup::Absent => lookup_header(policy.header(), source.authorization),
    }
}

fn lookup_cookie(
    policy: &Policy,
    source: &RawCredentialSource<'_>,
    unsigner: Option<&dyn CookieUnsigner>,
) -> CookieLookup {
    let CookieSource::Named(name) = policy.cookie() else {
        return CookieLookup::Absent;
    };
    let Some(jar) = &source.cookies else {
        return CookieLookup::Absent;
    };

    let raw = match jar.get(name).map(|c| c.value()) {
        Some(v) if !v.is_empty() => v,
        _ => return CookieLookup::Absent,
    };

    if !policy.cookie_signed() {
        return CookieLookup::Found(raw.to_string());
    }

    // Resolution guarantees an unsigner whenever signed cookies are read
    match unsigner.and_then(|u| u.unsign(name, raw)) {
        None => CookieLookup::Rejected,
        // Verified but empty (e.g. cleared on logout): no token from this phase
        Some(value) if value.is_empty() => CookieLookup::Absent,
        Some(value) => CookieLookup::Found(value),
    }
}

fn lookup_header(scheme: &HeaderSource, authorization: Option<&str>) -> Option<String> {
    let value = authorization.filter(|v| !v.is_empty())?;

    match scheme {
        HeaderSource::Disabled => None,
        HeaderSource::Raw => Some(value.to_string()),
        HeaderSource::Scheme(scheme) => {
            let mut parts = value.split(' ');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(s), Some(token), None) if s == scheme && !token.is_empty() => {
                    Some(token.to_string())
                }
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum_extra::extract::cookie::Cookie;
    use serde_json::json;

    use super::*;
    use crate::services::auth::policy::RawOptions;

    struct CountingUnsigner {
        calls: AtomicUsize,
        valid: bool,
    }

    impl CountingUnsigner {
        fn new(valid: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                valid,
            }
        }
    }

    impl CookieUnsigner for CountingUnsigner {
        fn unsign(&self, _name: &str, signed: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.valid
                .then(|| signed.strip_prefix("s:").unwrap_or(signed).to_string())
        }
    }

    fn policy(raw: RawOptions) -> Policy {
        Policy::resolve(&raw.with_auth(true)).unwrap()
    }

    fn base() -> RawOptions {
        RawOptions::new("meow")
    }

    fn jar(pairs: &[(&str, &str)]) -> Option<CookieJar> {
        let mut jar = CookieJar::new();
        for (name, value) in pairs {
            jar = jar.add(Cookie::new(name.to_string(), value.to_string()));
        }
        Some(jar)
    }

    fn source<'a>(
        cookies: Option<CookieJar>,
        authorization: Option<&'a str>,
    ) -> RawCredentialSource<'a> {
        RawCredentialSource {
            cookies,
            authorization,
        }
    }

    #[test]
    fn cookie_is_tried_before_header() {
        let src = source(jar(&[("token", "from-cookie")]), Some("from-header"));
        assert_eq!(
            extract_token(&policy(base()), &src, None).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn targets_the_configured_cookie() {
        let p = policy(base().with_cookie(json!("rawr")));
        let src = source(jar(&[("token", "nope"), ("rawr", "yes")]), None);
        assert_eq!(extract_token(&p, &src, None).as_deref(), Some("yes"));
    }

    #[test]
    fn disabled_cookie_is_never_read() {
        let p = policy(base().with_cookie(json!(false)).with_header(json!("User")));
        let src = source(jar(&[("token", "meow")]), None);
        assert_eq!(extract_token(&p, &src, None), None);
    }

    #[test]
    fn absent_cookie_falls_back_to_header() {
        let src = source(jar(&[("other", "x")]), Some("abc123"));
        assert_eq!(
            extract_token(&policy(base()), &src, None).as_deref(),
            Some("abc123")
        );

        let no_jar = source(None, Some("abc123"));
        assert_eq!(
            extract_token(&policy(base()), &no_jar, None).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn signed_cookie_is_unwrapped_once() {
        let p = policy(base().with_cookie_signed(json!(true)));
        let unsigner = CountingUnsigner::new(true);
        let src = source(jar(&[("token", "s:abc123")]), None);

        assert_eq!(
            extract_token(&p, &src, Some(&unsigner)).as_deref(),
            Some("abc123")
        );
        assert_eq!(unsigner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsigned_policy_never_calls_unsigner() {
        let unsigner = CountingUnsigner::new(true);
        let src = source(jar(&[("token", "s:abc123")]), None);

        assert_eq!(
            extract_token(&policy(base()), &src, Some(&unsigner)).as_deref(),
            Some("s:abc123")
        );
        assert_eq!(unsigner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejected_signed_cookie_does_not_fall_back_to_header() {
        let p = policy(base().with_cookie_signed(json!(true)));
        let unsigner = CountingUnsigner::new(false);
        let src = source(jar(&[("token", "forged")]), Some("valid-header-token"));

        assert_eq!(extract_token(&p, &src, Some(&unsigner)), None);
    }

    #[test]
    fn verified_empty_signed_cookie_falls_back_to_header() {
        let p = policy(base().with_cookie_signed(json!(true)));
        let unsigner = CountingUnsigner::new(true);
        let src = source(jar(&[("token", "s:")]), Some("valid-header-token"));

        assert_eq!(
            extract_token(&p, &src, Some(&unsigner)).as_deref(),
            Some("valid-header-token")
        );
        assert_eq!(unsigner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scheme_must_match_exactly() {
        let p = policy(base().with_header(json!("User")));

        let ok = source(None, Some("User abc123"));
        assert_eq!(extract_token(&p, &ok, None).as_deref(), Some("abc123"));

        let rejected = [
            "Other abc123",
            "user abc123",
            "abc123",
            "User a b",
            "User  abc123",
            "User ",
        ];
        for header in rejected {
            let src = source(None, Some(header));
            assert_eq!(extract_token(&p, &src, None), None, "header {header:?}");
        }
    }

    #[test]
    fn raw_header_mode_takes_whole_value() {
        let src = source(None, Some("Bearer abc123"));
        assert_eq!(
            extract_token(&policy(base()), &src, None).as_deref(),
            Some("Bearer abc123")
        );
    }

    #[test]
    fn disabled_header_is_never_read() {
        let p = policy(base().with_header(json!(false)));
        let src = source(Some(CookieJar::new()), Some("meow"));
        assert_eq!(extract_token(&p, &src, None), None);
    }

    #[test]
    fn reads_cookie_and_authorization_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "token=abc; other=1".parse().unwrap());
        headers.insert(header::AUTHORIZATION, "User xyz".parse().unwrap());

        let src = RawCredentialSource::from_headers(&headers);
        assert_eq!(src.authorization, Some("User xyz"));
        assert_eq!(
            src.cookies.as_ref().and_then(|j| j.get("token")).map(|c| c.value()),
            Some("abc")
        );

        let empty = HeaderMap::new();
        assert!(RawCredentialSource::from_headers(&empty).cookies.is_none());
    }
}
