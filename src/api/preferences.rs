//! Per-session presentation preferences, persisted in cookies with fixed
//! names and enum-restricted values. Theme resolution depends only on the
//! request (cookie + client hint), never on tenant or user data.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{get, put, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const THEME_COOKIE: &str = "crm-theme";
pub const LANG_COOKIE: &str = "crm-lang";

/// OS-preference client hint sent by browsers that were asked for it.
const COLOR_SCHEME_HINT: &str = "sec-ch-prefers-color-scheme";

const PREFERENCE_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
}

impl ThemeMode {
    /// Unknown persisted values fall back to `system` instead of erroring.
    fn from_cookie(value: &str) -> Self {
        match value {
            "light" => ThemeMode::Light,
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::System,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl Language {
    fn from_cookie(value: &str) -> Self {
        match value {
            "en" => Language::En,
            _ => Language::Es,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    pub fn direction(self) -> &'static str {
        // Both supported languages read left to right; the field exists so
        // the frontend sets document direction from one place.
        "ltr"
    }
}

/// An explicit mode wins; `system` follows the OS hint, light when the
/// browser sent none.
pub fn resolve_theme(mode: ThemeMode, os_hint: Option<ResolvedTheme>) -> ResolvedTheme {
    match mode {
        ThemeMode::Light => ResolvedTheme::Light,
        ThemeMode::Dark => ResolvedTheme::Dark,
        ThemeMode::System => os_hint.unwrap_or(ResolvedTheme::Light),
    }
}

fn os_hint(req: &HttpRequest) -> Option<ResolvedTheme> {
    let value = req.headers().get(COLOR_SCHEME_HINT)?.to_str().ok()?;
    match value.trim() {
        "dark" => Some(ResolvedTheme::Dark),
        "light" => Some(ResolvedTheme::Light),
        _ => None,
    }
}

fn preference_cookie(name: &'static str, value: &'static str) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(PREFERENCE_TTL_DAYS))
        .finish()
}

// --- DTOs (Data Transfer Objects) ---

#[derive(Serialize, ToSchema)]
pub struct ThemeView {
    pub mode: ThemeMode,
    pub resolved: ResolvedTheme,
}

#[derive(Deserialize, ToSchema)]
pub struct SetThemeDto {
    pub mode: ThemeMode,
}

#[derive(Serialize, ToSchema)]
pub struct LanguageView {
    pub language: Language,
    pub direction: &'static str,
}

#[derive(Deserialize, ToSchema)]
pub struct SetLanguageDto {
    pub language: Language,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/preferences/theme",
    tag = "Preferences",
    responses(
        (status = 200, description = "Current theme mode and its resolved value", body = ThemeView)
    )
)]
#[get("/theme")]
pub async fn get_theme(req: HttpRequest) -> HttpResponse {
    let mode = req
        .cookie(THEME_COOKIE)
        .map(|c| ThemeMode::from_cookie(c.value()))
        .unwrap_or(ThemeMode::System);
    HttpResponse::Ok().json(ThemeView {
        mode,
        resolved: resolve_theme(mode, os_hint(&req)),
    })
}

#[utoipa::path(
    put,
    path = "/api/preferences/theme",
    tag = "Preferences",
    request_body = SetThemeDto,
    responses(
        (status = 200, description = "Theme persisted for this browser", body = ThemeView)
    )
)]
#[put("/theme")]
pub async fn set_theme(req: HttpRequest, body: web::Json<SetThemeDto>) -> HttpResponse {
    let mode = body.mode;
    HttpResponse::Ok()
        .cookie(preference_cookie(THEME_COOKIE, mode.as_str()))
        .json(ThemeView {
            mode,
            resolved: resolve_theme(mode, os_hint(&req)),
        })
}

#[utoipa::path(
    get,
    path = "/api/preferences/language",
    tag = "Preferences",
    responses(
        (status = 200, description = "Current interface language", body = LanguageView)
    )
)]
#[get("/language")]
pub async fn get_language(req: HttpRequest) -> HttpResponse {
    let language = req
        .cookie(LANG_COOKIE)
        .map(|c| Language::from_cookie(c.value()))
        .unwrap_or(Language::Es);
    HttpResponse::Ok().json(LanguageView {
        language,
        direction: language.direction(),
    })
}

#[utoipa::path(
    put,
    path = "/api/preferences/language",
    tag = "Preferences",
    request_body = SetLanguageDto,
    responses(
        (status = 200, description = "Language persisted for this browser", body = LanguageView)
    )
)]
#[put("/language")]
pub async fn set_language(body: web::Json<SetLanguageDto>) -> HttpResponse {
    let language = body.language;
    HttpResponse::Ok()
        .cookie(preference_cookie(LANG_COOKIE, language.as_str()))
        .json(LanguageView {
            language,
            direction: language.direction(),
        })
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/preferences")
            .service(get_theme)
            .service(set_theme)
            .service(get_language)
            .service(set_language),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_mode_follows_the_os_hint() {
        assert_eq!(
            resolve_theme(ThemeMode::System, Some(ResolvedTheme::Dark)),
            ResolvedTheme::Dark
        );
        assert_eq!(resolve_theme(ThemeMode::System, None), ResolvedTheme::Light);
    }

    #[test]
    fn explicit_mode_overrides_the_os_hint() {
        assert_eq!(
            resolve_theme(ThemeMode::Light, Some(ResolvedTheme::Dark)),
            ResolvedTheme::Light
        );
        assert_eq!(
            resolve_theme(ThemeMode::Dark, Some(ResolvedTheme::Light)),
            ResolvedTheme::Dark
        );
    }

    #[test]
    fn unknown_cookie_values_fall_back_to_defaults() {
        assert_eq!(ThemeMode::from_cookie("sepia"), ThemeMode::System);
        assert_eq!(Language::from_cookie("fr"), Language::Es);
    }
}
