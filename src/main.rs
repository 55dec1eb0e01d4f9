use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing::info;
use user_management_api::application::auth_service::AuthService;
use user_management_api::application::user_service::UserService;
use user_management_api::data::credentials::InMemoryCredentialRepository;
use user_management_api::data::memory::InMemoryUserRepository;
use user_management_api::infrastructure::config::Config;
use user_management_api::infrastructure::logging::init_logging;
use user_management_api::presentation::auth::{login, register};
use user_management_api::presentation::handlers::{
    ApiError, AppState, create_user, delete_user, get_all_users, index, not_found, update_user,
};
use user_management_api::presentation::middleware::{JwtAuthMiddleware, RequestTraceMiddleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env()?;
    info!(host = %config.host, port = config.port, "Configuration loaded");

    let user_service = UserService::new(Arc::new(InMemoryUserRepository::new()));
    let auth_service = AuthService::new(
        Arc::new(InMemoryCredentialRepository::new()),
        config.jwt_secret.clone(),
    );
    let state = web::Data::new(AppState {
        user_service,
        auth_service,
    });

    let jwt_secret = config.jwt_secret.clone();
    let cors_origin = config.cors_origin.clone();

    info!("Configuring HTTP server");
    let server = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::Invariant(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                ApiError::Invariant(err.to_string()).into()
            }))
            .wrap(cors)
            .wrap(RequestTraceMiddleware)
            .route("/", web::get().to(index))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login)),
            )
            .service(
                web::scope("/api/users")
                    .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
                    .route("", web::post().to(create_user))
                    .route("", web::get().to(get_all_users))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user)),
            )
            .default_service(web::route().to(not_found))
    });

    let server = server.bind((config.host.as_str(), config.port))?;
    info!(
        host = %config.host,
        port = config.port,
        routes = %"GET /, POST /api/auth/register, POST /api/auth/login, POST /api/users, GET /api/users, PUT /api/users/{id}, DELETE /api/users/{id}",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
