use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use dotenvy::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use inmoflow::api::{
    activities, auth, health, leads, middleware, notifications, preferences, profile, properties,
    search, session, team, tenant,
};
use inmoflow::app_state::AppState;
use inmoflow::backend::models as backend_models;
use inmoflow::config::Config;
use inmoflow::queries;
use inmoflow::services::auth as auth_service;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");
    let state = AppState::new(config);

    if !state.is_ready() {
        log::warn!(
            "SUPABASE_URL / SUPABASE_ANON_KEY missing: running in degraded mode, \
             the auth gate lets every route through and data endpoints answer 503"
        );
    }

    #[derive(OpenApi)]
    #[openapi(
        paths(
            // Auth & session
            auth::auth_status,
            auth::login,
            auth::logout,
            session::get_session,
            // Preferences
            preferences::get_theme,
            preferences::set_theme,
            preferences::get_language,
            preferences::set_language,
            // Tenant
            tenant::get_tenant,
            // Leads
            leads::list_leads,
            leads::get_lead,
            leads::create_lead,
            leads::update_lead,
            leads::set_lead_status,
            leads::delete_lead,
            // Activities
            activities::list_activities,
            activities::create_activity,
            // Properties
            properties::list_properties,
            properties::get_property,
            properties::create_property,
            properties::update_property,
            properties::delete_property,
            properties::upload_property_image,
            // Team & profile
            team::list_team,
            team::update_team_member,
            profile::get_profile,
            profile::update_profile,
            // Notifications & search
            notifications::list_notifications,
            search::global_search,
            // Health
            health::health,
        ),
        components(
            schemas(
                // --- Models ---
                backend_models::Tenant,
                backend_models::TenantBranding,
                backend_models::TenantSettings,
                backend_models::User,
                backend_models::UserRole,
                backend_models::UserSummary,
                backend_models::PropertySummary,
                backend_models::Lead,
                backend_models::LeadIntent,
                backend_models::Property,
                backend_models::Activity,
                backend_models::ActivityType,

                // --- DTOs & API structs ---
                auth::LoginDto,
                auth::AuthStatusResponse,
                auth::LoginResponse,
                auth_service::AuthUser,
                session::SessionView,
                preferences::ThemeMode,
                preferences::ResolvedTheme,
                preferences::Language,
                preferences::ThemeView,
                preferences::SetThemeDto,
                preferences::LanguageView,
                preferences::SetLanguageDto,
                tenant::TenantView,
                tenant::TimezoneInfo,
                leads::SetStatusDto,
                queries::leads::NewLead,
                queries::leads::LeadPatch,
                queries::properties::NewProperty,
                queries::properties::PropertyPatch,
                queries::activities::NewActivity,
                queries::team::TeamMemberPatch,
                queries::profile::ProfilePatch,
                queries::MutationOutcome,
                queries::notifications::Notification,
                queries::search::SearchHit,
                queries::search::SearchKind,
                health::HealthResponse,
            )
        ),
        tags(
            (name = "Auth", description = "Sign-in, sign-out and demo-mode status"),
            (name = "Session", description = "Per-request session context"),
            (name = "Preferences", description = "Per-browser theme and language"),
            (name = "Tenant", description = "Tenant branding and settings"),
            (name = "Leads", description = "Pipeline lead management"),
            (name = "Activities", description = "Lead activity timelines"),
            (name = "Properties", description = "Property listings"),
            (name = "Team", description = "Team administration"),
            (name = "Profile", description = "Own profile"),
            (name = "Notifications", description = "Audit-log derived notifications"),
            (name = "Search", description = "Global search across leads, properties and tasks"),
            (name = "Health", description = "Service and backend health")
        )
    )]
    struct ApiDoc;

    let host = state.config.host.clone();
    let port = state.config.port;

    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(middleware::AuthGate)
            .wrap(middleware::RequestId)
            .wrap(Cors::permissive())
            .wrap(actix_middleware::NormalizePath::trim())
            .app_data(web::Data::new(state.clone()))
            .service(
                web::scope("/api")
                    .configure(auth::init_routes)
                    .configure(session::init_routes)
                    .configure(preferences::init_routes)
                    .configure(tenant::init_routes)
                    .configure(leads::init_routes)
                    .configure(properties::init_routes)
                    .configure(team::init_routes)
                    .configure(profile::init_routes)
                    .configure(notifications::init_routes)
                    .configure(search::init_routes)
                    .configure(health::init_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );

        // Dashboard assets, when a build is present next to the binary.
        if std::path::Path::new("./public").is_dir() {
            app = app.service(Files::new("/", "./public").index_file("index.html"));
        }

        app
    })
    .bind((host, port))?
    .run()
    .await
}
