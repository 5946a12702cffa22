use axum_extra::extract::cookie::Cookie;
use http::header::{InvalidHeaderValue, AUTHORIZATION, COOKIE};
use http::{HeaderMap, HeaderValue};

/// Name/value pairs of every `Cookie` header, in request order.
pub fn request_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| {
            Cookie::split_parse(value)
                .filter_map(Result::ok)
                .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    request_cookies(headers)
        .into_iter()
        .find(|(cookie_name, value)| cookie_name == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Rebuild the `Cookie` header without the `remove` cookies, replacing or
/// appending `set` when given. Multiple `Cookie` headers collapse into one.
pub fn rewrite_cookie_header(
    headers: &mut HeaderMap,
    remove: &[&str],
    set: Option<(&str, &str)>,
) -> Result<(), InvalidHeaderValue> {
    let mut kept: Vec<(String, String)> = request_cookies(headers)
        .into_iter()
        .filter(|(name, _)| !remove.contains(&name.as_str()))
        .filter(|(name, _)| set.map(|(replaced, _)| replaced != name.as_str()).unwrap_or(true))
        .collect();

    if let Some((name, value)) = set {
        kept.push((name.to_string(), value.to_string()));
    }

    headers.remove(COOKIE);
    if !kept.is_empty() {
        let joined = kept
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(COOKIE, HeaderValue::from_str(&joined)?);
    }

    Ok(())
}

/// Token of an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
