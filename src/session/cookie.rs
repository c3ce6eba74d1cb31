use axum::http::{header, HeaderMap};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "snipshare_session";

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .find_map(|part| {
            let (k, v) = part.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
}

/// Session id from the request cookie. Malformed ids count as absent.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    parse_cookie(headers, SESSION_COOKIE).and_then(|v| Uuid::parse_str(&v).ok())
}

pub fn set_session_cookie(id: Uuid, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}=deleted; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        h
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let id = Uuid::new_v4();
        let h = headers(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=en"));
        assert_eq!(session_id(&h), Some(id));
    }

    #[test]
    fn garbage_or_missing_cookie_is_none() {
        assert_eq!(session_id(&HeaderMap::new()), None);
        assert_eq!(session_id(&headers(&format!("{SESSION_COOKIE}=nope"))), None);
        assert_eq!(session_id(&headers("other=1")), None);
    }

    #[test]
    fn cookie_attributes() {
        let id = Uuid::new_v4();
        let set = set_session_cookie(id, 600, true);
        assert!(set.starts_with(&format!("{SESSION_COOKIE}={id};")));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=600"));
        assert!(set.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
