use crate::helper::form_helpers::{first_error, CommentForm, ContactFields, ContactForm};
use crate::helper::mail_helpers::{ContactMessage, MailError, Mailer};
use crate::helper::post_helpers;
use crate::middleware::AuthenticatedUser;
use crate::models::Notification;
use crate::routes::{db_error_page, page_context, redirect, render, render_with_status, set_notification};
use crate::{AppState, DbPool};
use actix_csrf::extractor::{Csrf, CsrfToken};
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use tera::Tera;

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(list_posts))
        .route("/post/{post_id}", web::get().to(show_post))
        .route("/post/{post_id}", web::post().to(add_comment))
        .route("/about", web::get().to(about_page))
        .route("/contact", web::get().to(show_contact_form))
        .route("/contact", web::post().to(send_contact_message));
}

async fn list_posts(
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let mut ctx = page_context(&session, &state);
    match post_helpers::fetch_all_posts(&pool) {
        Ok(posts) => {
            ctx.insert("posts", &posts);
            render(&tera, "index.html", &ctx)
        }
        Err(e) => db_error_page(&tera, &ctx, e, "Listing posts"),
    }
}

async fn show_post(
    path: web::Path<i64>,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    token: CsrfToken,
) -> HttpResponse {
    let post_id = path.into_inner();
    let mut ctx = page_context(&session, &state);
    match post_helpers::fetch_post_with_comments(&pool, post_id) {
        Ok((post, comments)) => {
            ctx.insert("post", &post);
            ctx.insert("comments", &comments);
            ctx.insert("csrf_token", token.get());
            render(&tera, "post.html", &ctx)
        }
        Err(e) => db_error_page(&tera, &ctx, e, "Showing post"),
    }
}

async fn add_comment(
    path: web::Path<i64>,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    current_user: Option<AuthenticatedUser>,
    form: Csrf<web::Form<CommentForm>>,
) -> HttpResponse {
    let post_id = path.into_inner();
    let post_url = format!("/post/{}", post_id);

    if let Err(e) = post_helpers::ensure_post_exists(&pool, post_id) {
        return db_error_page(&tera, &page_context(&session, &state), e, "Adding comment");
    }

    let user = match current_user {
        Some(user) => user,
        None => {
            set_notification(&session, "You need to login or register to comment.", "error");
            return redirect("/login");
        }
    };

    let form = form.into_inner().into_inner();
    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            set_notification(&session, &first_error(&errors), "error");
            return redirect(&post_url);
        }
    };

    match post_helpers::add_comment(&pool, post_id, user.id, &text) {
        Ok(comment_id) => {
            log::info!("User {} added comment {} to post {}.", user.id, comment_id, post_id);
            redirect(&post_url)
        }
        Err(e) => db_error_page(&tera, &page_context(&session, &state), e, "Adding comment"),
    }
}

async fn about_page(session: Session, tera: web::Data<Tera>, state: web::Data<AppState>) -> HttpResponse {
    render(&tera, "about.html", &page_context(&session, &state))
}

async fn show_contact_form(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    token: CsrfToken,
) -> HttpResponse {
    let mut ctx = page_context(&session, &state);
    ctx.insert("fields", &ContactFields::default());
    ctx.insert("csrf_token", token.get());
    render(&tera, "contact.html", &ctx)
}

async fn send_contact_message(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    mailer: web::Data<dyn Mailer>,
    form: Csrf<web::Form<ContactForm>>,
) -> HttpResponse {
    let form = form.into_inner().into_inner();
    let mut ctx = page_context(&session, &state);
    ctx.insert("csrf_token", form.csrf_token.get());
    ctx.insert("fields", &form.fields());

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            ctx.insert("errors", &errors);
            return render(&tera, "contact.html", &ctx);
        }
    };

    let message = ContactMessage::from(fields);
    let sender = mailer.clone();
    let outcome = web::block(move || sender.send_contact_message(&message))
        .await
        .map_err(MailError::from)
        .and_then(|sent| sent);

    match outcome {
        Ok(()) => {
            set_notification(&session, "Successfully sent your message", "success");
            return redirect("/contact");
        }
        Err(e) => log::error!("Failed to send contact message: {}", e),
    }

    ctx.insert(
        "notification",
        &Notification {
            message: "Your message could not be sent right now. Please try again in a few minutes.".to_string(),
            r#type: "error".to_string(),
        },
    );
    render_with_status(&tera, "contact.html", &ctx, StatusCode::SERVICE_UNAVAILABLE)
}
