use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::fmt;

pub const CURRENCY_COOKIE: &str = "preferred_currency";
pub const LANGUAGE_COOKIE: &str = "wearsearch_language";
pub const CSRF_COOKIE: &str = "csrf_token";

pub const ONE_YEAR_SECS: u64 = 60 * 60 * 24 * 365;

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
}

#[derive(Debug, Clone)]
pub struct SetCookie<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub max_age: Option<u64>,
    pub same_site: SameSite,
    pub http_only: bool,
}

impl<'a> SetCookie<'a> {
    pub fn preference(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            value,
            max_age: Some(ONE_YEAR_SECS),
            same_site: SameSite::Lax,
            http_only: false,
        }
    }
}

impl fmt::Display for SetCookie<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path=/", self.name, self.value)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        match self.same_site {
            SameSite::Lax => write!(f, "; SameSite=Lax")?,
            SameSite::Strict => write!(f, "; SameSite=Strict")?,
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        Ok(())
    }
}
