use crate::config::Config;
use crate::helper::mail_helpers::Mailer;
use crate::middleware::session_user;
use crate::models::db_operations::posts_db_operations::DbError;
use crate::models::Notification;
use crate::{AppState, DbPool};
use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpResponse};
use rand::prelude::StdRng;
use tera::{Context, Tera};

pub mod admin;
pub mod auth;
pub mod public;

/// Everything the handlers read through `web::Data`, built once by the server (or a test).
#[derive(Clone)]
pub struct SiteData {
    pub pool: web::Data<DbPool>,
    pub tera: web::Data<Tera>,
    pub config: web::Data<Config>,
    pub state: web::Data<AppState>,
    pub mailer: web::Data<dyn Mailer>,
}

/// Pages whose GET issues the CSRF cookie that the matching POST is checked against.
const CSRF_FORM_PAGES: [&str; 7] = [
    "/post/{post_id}",
    "/contact",
    "/new-post",
    "/edit-post/{post_id}",
    "/delete/{post_id}",
    "/login",
    "/register",
];

fn csrf_middleware() -> CsrfMiddleware<StdRng> {
    CSRF_FORM_PAGES
        .iter()
        .fold(CsrfMiddleware::<StdRng>::new(), |mw, pattern| mw.set_cookie(Method::GET, *pattern))
}

fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// Registers shared data and every page of the site behind the session and CSRF layers.
pub fn config_site(cfg: &mut web::ServiceConfig, site: &SiteData, session_key: Key) {
    cfg.app_data(site.pool.clone())
        .app_data(site.tera.clone())
        .app_data(site.config.clone())
        .app_data(site.state.clone())
        .app_data(site.mailer.clone())
        .service(
            web::scope("")
                .wrap(csrf_middleware())
                .wrap(session_middleware(session_key, site.config.use_secure_cookies))
                .configure(public::config_public)
                .configure(auth::config_auth)
                .configure(admin::config_admin)
                .default_service(web::to(not_found_handler)),
        );
}

// --- Shared response helpers ---

pub fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Could not store notification in session: {}", e);
    }
}

/// Base context for every page: the session user, the footer year and any pending flash notice.
pub fn page_context(session: &Session, state: &AppState) -> Context {
    let mut ctx = Context::new();
    let user = session_user(session);
    ctx.insert("is_admin", &user.as_ref().map_or(false, |u| u.is_admin()));
    ctx.insert("current_user", &user);
    ctx.insert("current_year", &state.current_year);

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }
    ctx
}

pub fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    render_with_status(tera, template, ctx, StatusCode::OK)
}

pub fn render_with_status(tera: &Tera, template: &str, ctx: &Context, status: StatusCode) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::build(status).content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in '{}': {:?}", template, err);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}

pub fn not_found_page(tera: &Tera, ctx: &Context) -> HttpResponse {
    render_with_status(tera, "404.html", ctx, StatusCode::NOT_FOUND)
}

/// Missing rows become the 404 page; anything else is logged and answered with a 500.
pub fn db_error_page(tera: &Tera, ctx: &Context, err: DbError, action: &str) -> HttpResponse {
    match err {
        DbError::NotFound(what) => {
            log::debug!("{} failed: {} not found", action, what);
            not_found_page(tera, ctx)
        }
        other => {
            log::error!("{} failed: {}", action, other);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

async fn not_found_handler(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
) -> HttpResponse {
    not_found_page(&tera, &page_context(&session, &state))
}
