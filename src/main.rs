use actix_web::{web, App, HttpServer, middleware::{Logger, DefaultHeaders}, cookie::Key};
use blog_backend::{
    config::Config,
    helper::mail_helpers::{Mailer, SmtpMailer},
    routes::{self, SiteData},
    setup::db_setup,
    AppState,
};
use chrono::Datelike;
use clap::Parser;
use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "blog_server", author, version, about = "Starts the blog web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    fs::create_dir_all(&config.database_path)
        .expect("Failed to create database directory");

    let pool = db_setup::init_pool(&config.blog_db_path())
        .expect("FATAL: Failed to open the blog database.");

    let mailer: Arc<dyn Mailer> = Arc::new(
        SmtpMailer::from_config(&config.smtp, &config.own_email, &config.own_password)
            .expect("FATAL: EMAIL is not a valid mailbox address or the SMTP relay is misconfigured."),
    );

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let site = SiteData {
        pool: web::Data::new(pool),
        tera: web::Data::new(tera),
        config: web::Data::new(config.clone()),
        state: web::Data::new(AppState { current_year: chrono::Local::now().year() }),
        mailer: web::Data::from(mailer),
    };

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let site = site.clone();
        let session_key = session_key.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            .service(actix_files::Files::new("/static", "./static"))
            .configure(|cfg| routes::config_site(cfg, &site, session_key))
    })
    .bind(server_address)?
    .run()
    .await
}
