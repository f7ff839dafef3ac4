use crate::config::Config;
use crate::helper::auth_helpers::{self, AuthError};
use crate::helper::form_helpers::{LoginForm, RegisterForm};
use crate::middleware::{AuthenticatedUser, SESSION_USER_KEY};
use crate::models::{Notification, User};
use crate::routes::{page_context, redirect, render};
use crate::{AppState, DbPool};
use actix_csrf::extractor::{Csrf, CsrfToken};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::{Context, Tera};

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_login_form))
        .route("/login", web::post().to(handle_login))
        .route("/register", web::get().to(show_register_form))
        .route("/register", web::post().to(handle_register))
        .route("/logout", web::get().to(handle_logout));
}

/// Binds the session to `user`. The session id is rotated first.
fn start_session(session: &Session, user: &User) -> HttpResponse {
    session.renew();
    if let Err(e) = session.insert(SESSION_USER_KEY, AuthenticatedUser::from(user)) {
        log::error!("Could not store user {} in session: {}", user.id, e);
        return HttpResponse::InternalServerError().body("Internal server error");
    }
    redirect("/")
}

fn auth_failure(tera: &Tera, template: &str, mut ctx: Context, err: AuthError) -> HttpResponse {
    if err.is_user_facing() {
        ctx.insert("notification", &Notification { message: err.to_string(), r#type: "error".to_string() });
        render(tera, template, &ctx)
    } else {
        log::error!("Authentication backend failure: {}", err);
        HttpResponse::InternalServerError().body("Internal server error")
    }
}

async fn show_login_form(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    token: CsrfToken,
    current_user: Option<AuthenticatedUser>,
) -> HttpResponse {
    if current_user.is_some() {
        return redirect("/");
    }
    let mut ctx = page_context(&session, &state);
    ctx.insert("csrf_token", token.get());
    ctx.insert("email", "");
    render(&tera, "login.html", &ctx)
}

async fn handle_login(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    form: Csrf<web::Form<LoginForm>>,
) -> HttpResponse {
    let form = form.into_inner().into_inner();
    let mut ctx = page_context(&session, &state);
    ctx.insert("csrf_token", form.csrf_token.get());
    ctx.insert("email", &form.email);

    if let Err(errors) = form.validate() {
        ctx.insert("errors", &errors);
        return render(&tera, "login.html", &ctx);
    }

    let email = form.email.clone();
    let password = form.password.clone();
    let pool = pool.clone();
    match web::block(move || auth_helpers::login_user(&pool, &email, &password)).await {
        Ok(Ok(user)) => {
            log::info!("User {} logged in.", user.id);
            start_session(&session, &user)
        }
        Ok(Err(e)) => auth_failure(&tera, "login.html", ctx, e),
        Err(e) => {
            log::error!("Login task failed: {}", e);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

async fn show_register_form(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    token: CsrfToken,
    current_user: Option<AuthenticatedUser>,
) -> HttpResponse {
    if current_user.is_some() {
        return redirect("/");
    }
    let mut ctx = page_context(&session, &state);
    ctx.insert("csrf_token", token.get());
    ctx.insert("email", "");
    ctx.insert("name", "");
    render(&tera, "register.html", &ctx)
}

async fn handle_register(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    form: Csrf<web::Form<RegisterForm>>,
) -> HttpResponse {
    let form = form.into_inner().into_inner();
    let mut ctx = page_context(&session, &state);
    ctx.insert("csrf_token", form.csrf_token.get());
    ctx.insert("email", &form.email);
    ctx.insert("name", &form.name);

    let account = match form.validate() {
        Ok(account) => account,
        Err(errors) => {
            ctx.insert("errors", &errors);
            return render(&tera, "register.html", &ctx);
        }
    };

    let pool = pool.clone();
    let cost = config.bcrypt_cost;
    match web::block(move || auth_helpers::register_user(&pool, &account, cost)).await {
        Ok(Ok(user)) => {
            log::info!("Registered user {} with role '{}'.", user.id, user.role);
            start_session(&session, &user)
        }
        Ok(Err(e)) => auth_failure(&tera, "register.html", ctx, e),
        Err(e) => {
            log::error!("Registration task failed: {}", e);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

async fn handle_logout(session: Session) -> HttpResponse {
    session.purge();
    redirect("/")
}
