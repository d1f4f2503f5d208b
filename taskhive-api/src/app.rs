/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskhive_api::app::build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::auth::{jwt, middleware::AuthUser};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; the pool and config are
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # public
/// ├── /users
/// │   ├── POST   /register                      # public
/// │   ├── POST   /login                         # public
/// │   ├── GET    /projects | /invitations | /tasks | /getuser
/// │   ├── DELETE /remove | /unfollowtask/:project_id/:task_id
/// │   ├── PATCH  /followtask/:project_id/:task_id
/// │   └── POST   /getlatestfollowedtaskcomments
/// ├── /projects
/// │   ├── POST   /add
/// │   ├── GET    /getproject/:id | /getrole/:id | /invitations/:id
/// │   ├── DELETE /delete/:id
/// │   ├── PATCH  /removeuser/:id/:uid | /updateuserrole/:id/:uid | /leave/:id
/// │   ├── /tasks/*                              # task sub-resources
/// │   └── /requirements/*                       # requirement sub-resources
/// └── /invitations
///     ├── POST   /addinvitation/:username | /accept/:id
///     └── DELETE /delete/:id
/// ```
///
/// Every route except register, login and the health check sits behind the
/// JWT layer, which rejects missing/invalid tokens before any handler logic
/// runs and injects the authenticated principal.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public user routes (no token yet)
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    // Token-scoped user routes
    let user_routes = Router::new()
        .route("/projects", get(routes::users::get_projects))
        .route("/invitations", get(routes::users::get_invitations))
        .route("/tasks", get(routes::users::get_tasks))
        .route("/getuser", get(routes::users::get_user))
        .route("/remove", delete(routes::users::remove_user))
        .route(
            "/followtask/:project_id/:task_id",
            patch(routes::users::follow_task),
        )
        .route(
            "/unfollowtask/:project_id/:task_id",
            delete(routes::users::unfollow_task),
        )
        .route(
            "/getlatestfollowedtaskcomments",
            post(routes::users::latest_followed_comments),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/gettask/:project_id/:task_id",
            get(routes::tasks::get_task),
        )
        .route("/addtask/:project_id", patch(routes::tasks::add_task))
        .route(
            "/removetask/:project_id/:task_id",
            patch(routes::tasks::remove_task),
        )
        .route(
            "/subtasks/:project_id/:task_id",
            get(routes::tasks::get_subtasks),
        )
        .route(
            "/updatesubtasks/:project_id/:task_id",
            patch(routes::tasks::update_subtasks),
        )
        .route(
            "/updatestatus/:project_id/:task_id",
            patch(routes::tasks::update_status),
        )
        .route(
            "/comments/:project_id/:task_id",
            get(routes::tasks::get_comments),
        )
        .route(
            "/comments/updatecomments/:project_id/:task_id",
            patch(routes::tasks::update_comments),
        );

    let requirement_routes = Router::new()
        .route(
            "/addrequirement/:project_id",
            patch(routes::requirements::add_requirement),
        )
        .route(
            "/updaterequirement/:project_id/:index",
            patch(routes::requirements::update_requirement),
        )
        .route(
            "/removerequirement/:project_id/:index",
            patch(routes::requirements::remove_requirement),
        )
        .route(
            "/getall/:project_id",
            get(routes::requirements::get_requirements),
        );

    let project_routes = Router::new()
        .route("/add", post(routes::projects::create_project))
        .route(
            "/getproject/:project_id",
            get(routes::projects::get_project),
        )
        .route("/getrole/:project_id", get(routes::projects::get_role))
        .route(
            "/delete/:project_id",
            delete(routes::projects::delete_project),
        )
        .route(
            "/invitations/:project_id",
            get(routes::projects::get_project_invitations),
        )
        .route(
            "/removeuser/:project_id/:user_id",
            patch(routes::projects::remove_member),
        )
        .route(
            "/updateuserrole/:project_id/:user_id",
            patch(routes::projects::change_member_role),
        )
        .route("/leave/:project_id", patch(routes::projects::leave_project))
        .nest("/tasks", task_routes)
        .nest("/requirements", requirement_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let invitation_routes = Router::new()
        .route(
            "/addinvitation/:username",
            post(routes::invitations::add_invitation),
        )
        .route(
            "/accept/:invitation_id",
            post(routes::invitations::accept_invitation),
        )
        .route(
            "/delete/:invitation_id",
            delete(routes::invitations::delete_invitation),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/users", public_user_routes.merge(user_routes))
        .nest("/projects", project_routes)
        .nest("/invitations", invitation_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects the authenticated principal into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthUser::from_claims(&claims));

    Ok(next.run(req).await)
}
