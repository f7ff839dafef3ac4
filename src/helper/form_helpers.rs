use crate::helper::mail_helpers::ContactMessage;
use crate::helper::sanitization_helpers::{sanitize_rich_text, strip_all_html};
use crate::models::PostDraft;
use actix_csrf::extractor::{CsrfGuarded, CsrfToken};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Field name -> message, rendered next to the offending input.
pub type FieldErrors = BTreeMap<&'static str, String>;

const SHORT_TEXT_MAX: usize = 250;
const EMAIL_MAX: usize = 100;
const NAME_MAX: usize = 1000;
const PHONE_MAX: usize = 50;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.insert(field, "This field is required.".to_string());
    } else if value.chars().count() > max_len {
        errors.insert(field, format!("Must be at most {} characters.", max_len));
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    require(errors, "email", value, EMAIL_MAX);
    if !errors.contains_key("email") && !email_regex().is_match(value.trim()) {
        errors.insert("email", "Invalid email address.".to_string());
    }
}

fn check_image_url(errors: &mut FieldErrors, value: &str) {
    require(errors, "img_url", value, SHORT_TEXT_MAX);
    if errors.contains_key("img_url") {
        return;
    }
    match url::Url::parse(value.trim()) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
        _ => {
            errors.insert("img_url", "Must be an absolute http or https URL.".to_string());
        }
    }
}

// --- Post form (create and edit) ---

#[derive(Deserialize)]
pub struct PostForm {
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub date: String,
}

impl CsrfGuarded for PostForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

/// What the post editor template displays in its inputs.
#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
    pub date: String,
}

impl PostFields {
    pub fn for_new_post(today: NaiveDate) -> Self {
        PostFields {
            date: today.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }
}

impl From<&crate::models::Post> for PostFields {
    fn from(post: &crate::models::Post) -> Self {
        PostFields {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
            date: post.date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl PostForm {
    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            img_url: self.img_url.clone(),
            body: self.body.clone(),
            date: self.date.clone(),
        }
    }

    pub fn validate(&self) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = strip_all_html(&self.title);
        let subtitle = strip_all_html(&self.subtitle);
        let body = sanitize_rich_text(&self.body);

        require(&mut errors, "title", &title, SHORT_TEXT_MAX);
        require(&mut errors, "subtitle", &subtitle, SHORT_TEXT_MAX);
        require(&mut errors, "body", &strip_all_html(&body), usize::MAX);
        check_image_url(&mut errors, &self.img_url);

        let date = match NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.insert("date", "Enter a date as YYYY-MM-DD.".to_string());
                None
            }
        };

        match date {
            Some(date) if errors.is_empty() => Ok(PostDraft {
                title,
                subtitle,
                date,
                body,
                img_url: self.img_url.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

// --- Account forms ---

#[derive(Deserialize)]
pub struct RegisterForm {
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

impl CsrfGuarded for RegisterForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

/// A registration that passed validation. The password is still plaintext here.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = strip_all_html(&self.name);
        check_email(&mut errors, &self.email);
        require(&mut errors, "name", &name, NAME_MAX);
        if self.password.is_empty() {
            errors.insert("password", "This field is required.".to_string());
        }

        if errors.is_empty() {
            Ok(NewAccount {
                email: self.email.trim().to_string(),
                name,
                password: self.password.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.insert("password", "This field is required.".to_string());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// --- Comment form ---

#[derive(Deserialize)]
pub struct CommentForm {
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub comment_text: String,
}

impl CsrfGuarded for CommentForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

impl CommentForm {
    /// Returns the sanitized comment body.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = sanitize_rich_text(&self.comment_text);
        require(&mut errors, "comment_text", &strip_all_html(&text), usize::MAX);
        if errors.is_empty() { Ok(text) } else { Err(errors) }
    }
}

// --- Contact form ---

#[derive(Deserialize)]
pub struct ContactForm {
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

impl CsrfGuarded for ContactForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    pub fn fields(&self) -> ContactFields {
        ContactFields {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            message: self.message.clone(),
        }
    }

    /// Returns trimmed values ready for the outgoing email.
    pub fn validate(&self) -> Result<ContactFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, NAME_MAX);
        check_email(&mut errors, &self.email);
        if self.phone.chars().count() > PHONE_MAX {
            errors.insert("phone", format!("Must be at most {} characters.", PHONE_MAX));
        }
        require(&mut errors, "message", &self.message, usize::MAX);

        if errors.is_empty() {
            Ok(ContactFields {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                phone: self.phone.trim().to_string(),
                message: self.message.trim().to_string(),
            })
        } else {
            Err(errors)
        }
    }
}

impl From<ContactFields> for ContactMessage {
    fn from(fields: ContactFields) -> Self {
        ContactMessage { name: fields.name, email: fields.email, phone: fields.phone, message: fields.message }
    }
}

// --- Delete confirmation ---

/// The delete confirmation page posts nothing but its token.
#[derive(Deserialize)]
pub struct ConfirmForm {
    pub csrf_token: CsrfToken,
}

impl CsrfGuarded for ConfirmForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

/// Picks the first message out of a set of field errors, for flash notices.
pub fn first_error(errors: &FieldErrors) -> String {
    errors
        .iter()
        .next()
        .map(|(field, message)| format!("{}: {}", field, message))
        .unwrap_or_else(|| "Invalid input.".to_string())
}
