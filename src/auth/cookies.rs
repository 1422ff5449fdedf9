use axum::http::{header, HeaderMap};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

pub fn build_token_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}");

    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

pub fn build_clear_cookie(name: &str, secure: bool) -> String {
    build_token_cookie(name, "", 0, secure)
}

pub fn read_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_header| cookie_header.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            let value = value.trim();
            (name.trim() == cookie_name && !value.is_empty()).then(|| value.to_string())
        })
}
