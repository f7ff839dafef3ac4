use clap::{Parser, Subcommand};
use blog_backend::config::Config;
use blog_backend::models::db_operations::users_db_operations;
use blog_backend::models::Role;
use blog_backend::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial blog setup and administrator accounts.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates the users, posts and comments tables if they are missing.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
    },
    /// Grants the administrator role to an existing reader account.
    Promote {
        #[arg(long)]
        email: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_blog_database(&config),
        },
        Commands::Admin { action } => {
            let conn = match open_existing_database(&config) {
                Some(conn) => conn,
                None => return,
            };
            match action {
                AdminAction::Create { email, name, password } => {
                    create_admin_user(&conn, &config, email, name, password)
                }
                AdminAction::List => list_admin_users(&conn),
                AdminAction::ChangePassword { email, new_password } => {
                    change_admin_password(&conn, &config, email, new_password)
                }
                AdminAction::Promote { email } => promote_user(&conn, email),
            }
        }
    }
}

fn setup_blog_database(config: &Config) {
    let db_path = config.blog_db_path();
    println!("\nSetting up blog database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        if let Err(e) = fs::create_dir_all(parent_dir) {
            eprintln!("❌ Error: Could not create database directory: {}", e);
            return;
        }
    }

    let mut conn = match Connection::open(&db_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Error: Could not open blog database file: {}", e);
            return;
        }
    };
    match db_setup::setup_blog_db(&mut conn) {
        Ok(_) => println!("✅ Blog database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up blog database: {}", e),
    }
}

fn open_existing_database(config: &Config) -> Option<Connection> {
    let db_path = config.blog_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Blog database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening blog database: {}", e);
            None
        }
    }
}

fn create_admin_user(conn: &Connection, config: &Config, email: &str, name: &str, password: &str) {
    match users_db_operations::create_user(conn, email, name, password, Role::Admin, config.bcrypt_cost) {
        Ok(id) => println!("✅ Admin user '{}' created successfully (id {}).", email, id),
        Err(e) if users_db_operations::is_unique_violation(&e) => {
            eprintln!("❌ Error: An account with email '{}' already exists. Use `admin promote` instead.", email)
        }
        Err(e) => eprintln!("❌ Error creating admin user: {}", e),
    }
}

fn list_admin_users(conn: &Connection) {
    println!("Listing Admin Users:");
    match users_db_operations::read_users_by_role(conn, Role::Admin) {
        Ok(admins) if admins.is_empty() => println!("(none)"),
        Ok(admins) => {
            for admin in admins {
                println!("- {} <{}>", admin.name, admin.email);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}

fn change_admin_password(conn: &Connection, config: &Config, email: &str, new_password: &str) {
    let is_admin = matches!(
        users_db_operations::read_user_by_email(conn, email),
        Ok(Some(ref user)) if user.role == Role::Admin
    );
    if !is_admin {
        eprintln!("❌ Error: No admin user with email '{}' found.", email);
        return;
    }
    match users_db_operations::update_password(conn, email, new_password, config.bcrypt_cost) {
        Ok(0) => eprintln!("❌ Error: No admin user with email '{}' found.", email),
        Ok(_) => println!("✅ Password for admin user '{}' changed successfully.", email),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}

fn promote_user(conn: &Connection, email: &str) {
    match users_db_operations::update_role(conn, email, Role::Admin) {
        Ok(0) => eprintln!("❌ Error: No account with email '{}' found.", email),
        Ok(_) => println!("✅ '{}' is now an administrator.", email),
        Err(e) => eprintln!("❌ Error promoting user: {}", e),
    }
}
