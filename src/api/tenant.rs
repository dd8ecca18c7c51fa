use actix_web::{get, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::backend::models::Tenant;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimezoneInfo {
    /// IANA name, e.g. "Europe/Madrid".
    pub name: String,
    /// Offset from UTC in seconds.
    pub offset_seconds: i32,
    pub abbreviation: String,
}

fn timezone_info(timezone: Tz, at_time: DateTime<Utc>) -> TimezoneInfo {
    let local = at_time.with_timezone(&timezone);
    TimezoneInfo {
        name: timezone.to_string(),
        offset_seconds: local.offset().fix().local_minus_utc(),
        abbreviation: local.format("%Z").to_string(),
    }
}

fn format_local(at_time: DateTime<Utc>, timezone: Tz) -> String {
    at_time
        .with_timezone(&timezone)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

#[derive(Serialize, ToSchema)]
pub struct TenantView {
    pub tenant: Tenant,
    pub timezone: TimezoneInfo,
    /// Current time rendered in the tenant's timezone.
    pub local_time: String,
}

#[utoipa::path(
    get,
    path = "/api/tenant",
    tag = "Tenant",
    responses(
        (status = 200, description = "Tenant branding, settings and localized clock", body = TenantView),
        (status = 401, description = "No authenticated session"),
        (status = 403, description = "Demo sessions have no tenant")
    )
)]
#[get("")]
pub async fn get_tenant(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;

    // Tenant timezone first, server timezone as fallback.
    let timezone = authed
        .tenant
        .settings
        .timezone
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
        .or_else(|| state.config.get_timezone().ok())
        .unwrap_or(chrono_tz::UTC);

    let now = Utc::now();
    Ok(HttpResponse::Ok().json(TenantView {
        tenant: authed.tenant.clone(),
        timezone: timezone_info(timezone, now),
        local_time: format_local(now, timezone),
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/tenant").service(get_tenant));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timezone_info_reports_offset_and_abbreviation() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let info = timezone_info(chrono_tz::Europe::Madrid, at);
        assert_eq!(info.name, "Europe/Madrid");
        assert_eq!(info.offset_seconds, 3600);
    }

    #[test]
    fn local_time_renders_in_the_tenant_zone() {
        let at = Utc.with_ymd_and_hms(2026, 7, 1, 10, 0, 0).unwrap();
        let formatted = format_local(at, chrono_tz::Europe::Madrid);
        assert!(formatted.starts_with("2026-07-01 12:00:00"));
    }
}
