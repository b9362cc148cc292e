use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use amora_shared::clients::db::{create_pool, DbPool};
use amora_shared::clients::email::EmailClient;
use amora_shared::clients::push::PushClient;
use amora_shared::clients::storage::StorageClient;
use amora_shared::types::AuthKeys;
use config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub auth_keys: AuthKeys,
    pub storage: StorageClient,
    pub email: EmailClient,
    pub push: PushClient,
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> AuthKeys {
        state.auth_keys.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url)?;

    let storage = StorageClient::new(
        &config.s3_endpoint,
        &config.s3_access_key,
        &config.s3_secret_key,
        &config.avatars_bucket,
        &config.gallery_bucket,
    )
    .await;

    let email = EmailClient::new(&config.mail_api_key, &config.mail_from, "Amora");
    let push = PushClient::new(&config.push_gateway_url);

    let auth_keys = AuthKeys {
        access_secret: config.access_secret.clone(),
        refresh_secret: config.refresh_secret.clone(),
    };

    let state = AppState {
        db,
        config,
        auth_keys,
        storage,
        email,
        push,
    };

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // account lifecycle
        .route("/register", post(routes::register::register))
        .route("/login", post(routes::login::login))
        .route("/refresh", get(routes::refresh::refresh))
        .route("/verify/:id", get(routes::verify::verify_email))
        .route("/resend/:email", get(routes::verify::resend_verification))
        // discovery + affinity
        .route("/cards", get(routes::cards::cards))
        .route("/like", post(routes::affinity::like))
        .route("/dislike", post(routes::affinity::dislike))
        .route("/likes", get(routes::affinity::list_likes))
        .route("/dislikes", get(routes::affinity::list_dislikes))
        // profile
        .route(
            "/profile",
            get(routes::profile::get_own)
                .patch(routes::profile::update)
                .delete(routes::profile::delete_account),
        )
        .route("/profile/:id", get(routes::profile::get_by_id))
        .route("/gdpr", get(routes::profile::gdpr_export))
        // media
        .route(
            "/images",
            post(routes::images::upload_image)
                .get(routes::images::list_images)
                .delete(routes::images::delete_image),
        )
        .route(
            "/avatar",
            post(routes::images::upload_avatar).delete(routes::images::delete_avatar),
        )
        // messaging
        .route("/messages", post(routes::messages::send_message))
        .route("/messages/:peer", get(routes::messages::conversation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amora-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
