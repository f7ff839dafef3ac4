use crate::helper::form_helpers::{ConfirmForm, PostFields, PostForm};
use crate::helper::post_helpers;
use crate::middleware::{AdminOnly, AuthenticatedUser};
use crate::routes::{db_error_page, page_context, redirect, render, set_notification};
use crate::{AppState, DbPool};
use actix_csrf::extractor::{Csrf, CsrfToken};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::{Context, Tera};

/// Post authoring. Every resource here sits behind `AdminOnly`.
pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/new-post")
            .route(web::get().to(show_new_post_form))
            .route(web::post().to(create_post))
            .wrap(AdminOnly),
    )
    .service(
        web::resource("/edit-post/{post_id}")
            .route(web::get().to(show_edit_post_form))
            .route(web::post().to(update_post))
            .wrap(AdminOnly),
    )
    .service(
        web::resource("/delete/{post_id}")
            .route(web::get().to(show_delete_confirmation))
            .route(web::post().to(delete_post))
            .wrap(AdminOnly),
    );
}

fn editor_context(mut ctx: Context, heading: &str, action: &str, fields: &PostFields, csrf_token: &str) -> Context {
    ctx.insert("heading", heading);
    ctx.insert("form_action", action);
    ctx.insert("fields", fields);
    ctx.insert("csrf_token", csrf_token);
    ctx
}

async fn show_new_post_form(
    session: Session,
    tera: web::Data<Tera>,
    state: web::Data<AppState>,
    token: CsrfToken,
) -> HttpResponse {
    let today = chrono::Local::now().date_naive();
    let ctx = editor_context(
        page_context(&session, &state),
        "New Post",
        "/new-post",
        &PostFields::for_new_post(today),
        token.get(),
    );
    render(&tera, "make-post.html", &ctx)
}

async fn create_post(
    admin: AuthenticatedUser,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    form: Csrf<web::Form<PostForm>>,
) -> HttpResponse {
    let form = form.into_inner().into_inner();
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let mut ctx = editor_context(
                page_context(&session, &state),
                "New Post",
                "/new-post",
                &form.fields(),
                form.csrf_token.get(),
            );
            ctx.insert("errors", &errors);
            return render(&tera, "make-post.html", &ctx);
        }
    };

    match post_helpers::create_post(&pool, &draft, admin.id) {
        Ok(post_id) => {
            log::info!("Admin {} published post {}.", admin.id, post_id);
            set_notification(&session, "Post published.", "success");
            redirect("/")
        }
        Err(e) => db_error_page(&tera, &page_context(&session, &state), e, "Creating post"),
    }
}

async fn show_edit_post_form(
    path: web::Path<i64>,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    token: CsrfToken,
) -> HttpResponse {
    let post_id = path.into_inner();
    let ctx = page_context(&session, &state);
    match post_helpers::fetch_post(&pool, post_id) {
        Ok(post) => {
            let action = format!("/edit-post/{}", post_id);
            let ctx = editor_context(ctx, "Edit Post", &action, &PostFields::from(&post), token.get());
            render(&tera, "make-post.html", &ctx)
        }
        Err(e) => db_error_page(&tera, &ctx, e, "Loading post for edit"),
    }
}

async fn update_post(
    path: web::Path<i64>,
    admin: AuthenticatedUser,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    form: Csrf<web::Form<PostForm>>,
) -> HttpResponse {
    let post_id = path.into_inner();
    let form = form.into_inner().into_inner();
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let action = format!("/edit-post/{}", post_id);
            let mut ctx = editor_context(
                page_context(&session, &state),
                "Edit Post",
                &action,
                &form.fields(),
                form.csrf_token.get(),
            );
            ctx.insert("errors", &errors);
            return render(&tera, "make-post.html", &ctx);
        }
    };

    match post_helpers::update_post(&pool, post_id, &draft, admin.id) {
        Ok(()) => {
            log::info!("Admin {} edited post {}.", admin.id, post_id);
            redirect(&format!("/post/{}", post_id))
        }
        Err(e) => db_error_page(&tera, &page_context(&session, &state), e, "Updating post"),
    }
}

async fn show_delete_confirmation(
    path: web::Path<i64>,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    token: CsrfToken,
) -> HttpResponse {
    let mut ctx = page_context(&session, &state);
    match post_helpers::fetch_post(&pool, path.into_inner()) {
        Ok(post) => {
            ctx.insert("post", &post);
            ctx.insert("csrf_token", token.get());
            render(&tera, "delete.html", &ctx)
        }
        Err(e) => db_error_page(&tera, &ctx, e, "Loading post for deletion"),
    }
}

async fn delete_post(
    path: web::Path<i64>,
    admin: AuthenticatedUser,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    _form: Csrf<web::Form<ConfirmForm>>,
) -> HttpResponse {
    let post_id = path.into_inner();
    match post_helpers::delete_post(&pool, post_id) {
        Ok(()) => {
            log::info!("Admin {} deleted post {} and its comments.", admin.id, post_id);
            set_notification(&session, "Post deleted.", "success");
            redirect("/")
        }
        Err(e) => db_error_page(&tera, &page_context(&session, &state), e, "Deleting post"),
    }
}
