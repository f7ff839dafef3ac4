#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web};
use blog_backend::config::{Config, SmtpConfig, WebConfig};
use blog_backend::helper::mail_helpers::{ContactMessage, MailError, Mailer};
use blog_backend::models::db_operations::{comments_db_operations, posts_db_operations, users_db_operations};
use blog_backend::models::{Comment, Post, PostDraft, Role};
use blog_backend::routes::SiteData;
use blog_backend::setup::db_setup;
use blog_backend::AppState;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tera::Tera;

/// Builds the full site (session, CSRF, guard and every route) over `$site`.
macro_rules! init_app {
    ($site:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(|cfg| {
            blog_backend::routes::config_site(cfg, &$site, actix_web::cookie::Key::generate())
        }))
        .await
    };
}

// --- Mailers ---

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ContactMessage>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<ContactMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send_contact_message(&self, msg: &ContactMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

pub struct FailingMailer;

impl Mailer for FailingMailer {
    fn send_contact_message(&self, _msg: &ContactMessage) -> Result<(), MailError> {
        let refused = "relay unreachable".parse::<lettre::Address>().unwrap_err();
        Err(MailError::Address(refused))
    }
}

// --- Site fixtures ---

pub fn test_config() -> Config {
    Config {
        web: WebConfig { host: "127.0.0.1".to_string(), port: 8080 },
        smtp: SmtpConfig { host: "smtp.example.com".to_string(), port: 587, timeout_secs: 1 },
        database_path: "/tmp/blog-test".to_string(),
        log_level: "debug".to_string(),
        session_secret_key: "ab".repeat(64),
        use_secure_cookies: false,
        bcrypt_cost: 4,
        own_email: "owner@example.com".to_string(),
        own_password: "secret".to_string(),
    }
}

pub fn site_with_mailer(mailer: Arc<dyn Mailer>) -> SiteData {
    SiteData {
        pool: web::Data::new(db_setup::init_memory_pool().unwrap()),
        tera: web::Data::new(Tera::new("templates/**/*.html").unwrap()),
        config: web::Data::new(test_config()),
        state: web::Data::new(AppState { current_year: 2024 }),
        mailer: web::Data::from(mailer),
    }
}

pub fn test_site() -> SiteData {
    site_with_mailer(Arc::new(RecordingMailer::default()))
}

pub fn seed_user(site: &SiteData, email: &str, name: &str, password: &str, role: Role) -> i64 {
    let conn = site.pool.get().unwrap();
    users_db_operations::create_user(&conn, email, name, password, role, 4).unwrap()
}

pub fn seed_post(site: &SiteData, title: &str, date: (i32, u32, u32), author_id: i64) -> i64 {
    let draft = PostDraft {
        title: title.to_string(),
        subtitle: format!("{} subtitle", title),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        body: format!("<p>{} body</p>", title),
        img_url: "https://example.com/cover.png".to_string(),
    };
    let conn = site.pool.get().unwrap();
    posts_db_operations::create_post(&conn, &draft, author_id).unwrap()
}

pub fn all_posts(site: &SiteData) -> Vec<Post> {
    let conn = site.pool.get().unwrap();
    posts_db_operations::read_all_posts(&conn).unwrap()
}

pub fn comments_on(site: &SiteData, post_id: i64) -> Vec<Comment> {
    let conn = site.pool.get().unwrap();
    comments_db_operations::read_comments_for_post(&conn, post_id).unwrap()
}

// --- A tiny browser: cookie jar plus request helpers ---

/// Carries the session and CSRF cookies from one response to the next request.
#[derive(Default)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    fn apply(&self, mut req: test::TestRequest) -> test::TestRequest {
        for (name, value) in &self.cookies {
            req = req.cookie(Cookie::new(name.clone(), value.clone()));
        }
        req
    }

    fn store<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }
}

pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl Page {
    pub fn csrf_token(&self) -> String {
        let marker = r#"name="csrf_token" value=""#;
        let start = self.body.find(marker).expect("page has no csrf_token input") + marker.len();
        let end = self.body[start..].find('"').expect("unterminated csrf_token value") + start;
        html_escape::decode_html_entities(&self.body[start..end]).into_owned()
    }
}

pub async fn send<S, B>(app: &S, jar: &mut CookieJar, req: test::TestRequest) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, jar.apply(req).to_request()).await;
    jar.store(&resp);
    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = test::read_body(resp).await;
    Page { status, location, body: String::from_utf8_lossy(&body).into_owned() }
}

pub async fn get_page<S, B>(app: &S, jar: &mut CookieJar, uri: &str) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    send(app, jar, test::TestRequest::get().uri(uri)).await
}

/// Opens `form_page` to obtain a fresh CSRF token, then posts `fields` to `action`.
pub async fn submit_form<S, B>(
    app: &S,
    jar: &mut CookieJar,
    form_page: &str,
    action: &str,
    fields: &[(&str, &str)],
) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let token = get_page(app, jar, form_page).await.csrf_token();
    let mut form: Vec<(&str, &str)> = vec![("csrf_token", token.as_str())];
    form.extend_from_slice(fields);
    send(app, jar, test::TestRequest::post().uri(action).set_form(&form)).await
}

pub async fn login<S, B>(app: &S, jar: &mut CookieJar, email: &str, password: &str) -> Page
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    submit_form(app, jar, "/login", "/login", &[("email", email), ("password", password)]).await
}
