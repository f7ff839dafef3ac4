#[macro_use]
mod common;

use actix_web::http::StatusCode;
use blog_backend::models::Role;
use common::*;

#[actix_web::test]
async fn home_lists_posts_newest_first() {
    let site = test_site();
    let admin = seed_user(&site, "owner@x.com", "Owner", "pw0", Role::Admin);
    seed_post(&site, "Middle", (2024, 2, 1), admin);
    seed_post(&site, "Oldest", (2023, 12, 31), admin);
    seed_post(&site, "Newest", (2024, 3, 15), admin);
    let app = init_app!(site);
    let mut jar = CookieJar::default();

    let home = get_page(&app, &mut jar, "/").await;
    assert_eq!(home.status, StatusCode::OK);
    let newest = home.body.find("Newest").unwrap();
    let middle = home.body.find("Middle").unwrap();
    let oldest = home.body.find("Oldest").unwrap();
    assert!(newest < middle && middle < oldest);
    assert!(home.body.contains("March 15, 2024"));
    // Readers get no authoring controls.
    assert!(!home.body.contains("/edit-post/"));
}

#[actix_web::test]
async fn post_page_renders_body_and_missing_post_is_404() {
    let site = test_site();
    let admin = seed_user(&site, "owner@x.com", "Owner", "pw0", Role::Admin);
    let post_id = seed_post(&site, "Hello", (2024, 1, 1), admin);
    let app = init_app!(site);
    let mut jar = CookieJar::default();

    let page = get_page(&app, &mut jar, &format!("/post/{}", post_id)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("<p>Hello body</p>"));
    assert!(page.body.contains("Posted by Owner"));

    let missing = get_page(&app, &mut jar, "/post/999").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body.contains("Page not found"));

    let unknown = get_page(&app, &mut jar, "/no-such-page").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_comment_is_refused_and_redirects_to_login() {
    let site = test_site();
    let admin = seed_user(&site, "owner@x.com", "Owner", "pw0", Role::Admin);
    let post_id = seed_post(&site, "Hello", (2024, 1, 1), admin);
    let app = init_app!(site);
    let mut jar = CookieJar::default();
    let post_url = format!("/post/{}", post_id);

    let resp = submit_form(&app, &mut jar, &post_url, &post_url, &[("comment_text", "Hi")]).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location.as_deref(), Some("/login"));
    assert!(comments_on(&site, post_id).is_empty());

    let login_page = get_page(&app, &mut jar, "/login").await;
    assert!(login_page.body.contains("You need to login or register to comment."));
}

#[actix_web::test]
async fn comment_on_missing_post_is_404_even_when_anonymous() {
    let site = test_site();
    seed_user(&site, "r@x.com", "Rae", "pw1", Role::Reader);
    let app = init_app!(site);

    let mut anonymous = CookieJar::default();
    let resp = submit_form(&app, &mut anonymous, "/contact", "/post/999", &[("comment_text", "Hi")]).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.location.is_none());

    let mut reader = CookieJar::default();
    login(&app, &mut reader, "r@x.com", "pw1").await;
    let resp = submit_form(&app, &mut reader, "/contact", "/post/999", &[("comment_text", "Hi")]).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn logged_in_comment_is_stored_once_and_shown() {
    let site = test_site();
    let admin = seed_user(&site, "owner@x.com", "Owner", "pw0", Role::Admin);
    seed_user(&site, "r@x.com", "Reader Rae", "pw1", Role::Reader);
    let post_id = seed_post(&site, "Hello", (2024, 1, 1), admin);
    let app = init_app!(site);
    let mut jar = CookieJar::default();
    let post_url = format!("/post/{}", post_id);

    login(&app, &mut jar, "r@x.com", "pw1").await;
    let resp = submit_form(
        &app,
        &mut jar,
        &post_url,
        &post_url,
        &[("comment_text", "<p>Nice post</p><script>alert(1)</script>")],
    )
    .await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location.as_deref(), Some(post_url.as_str()));

    let comments = comments_on(&site, post_id);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "<p>Nice post</p>");
    assert_eq!(comments[0].author_name, "Reader Rae");

    let page = get_page(&app, &mut jar, &post_url).await;
    assert!(page.body.contains("<p>Nice post</p>"));
    assert!(page.body.contains("Reader Rae"));
    let decoded = html_escape::decode_html_entities(&page.body);
    assert!(decoded.contains(
        r#"src="https://www.gravatar.com/avatar/ce8e3c356074c00b6385fe6a4b41110b?s=100&d=retro&r=g""#
    ));
}

#[actix_web::test]
async fn empty_comment_is_rejected_without_a_row() {
    let site = test_site();
    let admin = seed_user(&site, "owner@x.com", "Owner", "pw0", Role::Admin);
    let post_id = seed_post(&site, "Hello", (2024, 1, 1), admin);
    let app = init_app!(site);
    let mut jar = CookieJar::default();
    let post_url = format!("/post/{}", post_id);

    login(&app, &mut jar, "owner@x.com", "pw0").await;
    let resp = submit_form(&app, &mut jar, &post_url, &post_url, &[("comment_text", "   ")]).await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert!(comments_on(&site, post_id).is_empty());
}

#[actix_web::test]
async fn about_page_renders() {
    let site = test_site();
    let app = init_app!(site);
    let mut jar = CookieJar::default();

    let page = get_page(&app, &mut jar, "/about").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("About Me"));
    assert!(page.body.contains("2024"));
}
