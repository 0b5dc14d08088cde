use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

/// Attributes applied to every session cookie. Production deployments run
/// cross-site (frontend on another origin), which forces `SameSite=None` and
/// therefore `Secure`; development stays on `Lax` over plain HTTP.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieOptions {
    pub fn for_environment(production: bool) -> Self {
        if production {
            Self {
                secure: true,
                same_site: SameSite::None,
            }
        } else {
            Self {
                secure: false,
                same_site: SameSite::Lax,
            }
        }
    }
}

pub const ACCESS_COOKIE_NAME: &str = "sb-access-token";
pub const REFRESH_COOKIE_NAME: &str = "sb-refresh-token";
pub const COOKIE_PATH: &str = "/";

pub fn build_auth_cookie(
    name: &str,
    value: &str,
    max_age: Duration,
    options: CookieOptions,
) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite={}",
        name,
        value,
        COOKIE_PATH,
        max_age.as_secs(),
        same_site_value(options.same_site)
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn build_clear_cookie(name: &str, options: CookieOptions) -> String {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; HttpOnly; SameSite={}",
        name,
        COOKIE_PATH,
        same_site_value(options.same_site)
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

fn same_site_value(same_site: SameSite) -> &'static str {
    match same_site {
        SameSite::Lax => "Lax",
        SameSite::Strict => "Strict",
        SameSite::None => "None",
    }
}
