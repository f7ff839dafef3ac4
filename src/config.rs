use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub smtp: SmtpConfig,
    // These fields will be populated from the .env file
    pub database_path: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub bcrypt_cost: u32,
    /// Operator mailbox: contact messages are sent from and to this address.
    pub own_email: String,
    pub own_password: String,
}

fn required(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String, config::ConfigError> {
    lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            key
        ))
    })
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        // Load the specified .env file. Propagate an error if it fails.
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, config::ConfigError> {
        let database_path = required(lookup, "DATABASE_PATH")?;
        let session_secret_key = required(lookup, "SESSION_SECRET_KEY")?;
        let own_email = required(lookup, "EMAIL")?;
        let own_password = required(lookup, "OWN_PASSWORD")?;

        // The cookie key must be 128 hex characters (64 bytes).
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string()
            ));
        }

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let use_secure_cookies = lookup("USE_SECURE_COOKIES")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(config::ConfigError::Message(format!(
                        "FATAL: 'BCRYPT_COST' must be a whole number between 4 and 31, got '{}'.",
                        raw
                    )))
                }
            },
            None => bcrypt::DEFAULT_COST,
        };

        let mut builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8080)?
            .set_default("smtp.host", "smtp.mail.yahoo.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.timeout_secs", 10)?
            // Base settings from the TOML file, when present.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml).required(false))
            .set_override("database_path", database_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("bcrypt_cost", i64::from(bcrypt_cost))?
            .set_override("own_email", own_email)?
            .set_override("own_password", own_password)?;

        if let Some(host) = lookup("SMTP_HOST") {
            builder = builder.set_override("smtp.host", host)?;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            let port = port.parse::<u16>().map_err(|_| config::ConfigError::Message(format!(
                "FATAL: 'SMTP_PORT' must be a valid port number, got '{}'.", port
            )))?;
            builder = builder.set_override("smtp.port", i64::from(port))?;
        }
        if let Some(timeout) = lookup("SMTP_TIMEOUT_SECS") {
            let timeout = timeout.parse::<u64>().map_err(|_| config::ConfigError::Message(format!(
                "FATAL: 'SMTP_TIMEOUT_SECS' must be a whole number of seconds, got '{}'.", timeout
            )))?;
            builder = builder.set_override("smtp.timeout_secs", timeout as i64)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Returns the full path to the blog database file.
    pub fn blog_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("blog.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("DATABASE_PATH", "/var/lib/blog".to_string());
        vars.insert("SESSION_SECRET_KEY", "ab".repeat(64));
        vars.insert("EMAIL", "owner@example.com".to_string());
        vars.insert("OWN_PASSWORD", "app-password".to_string());
        vars
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, config::ConfigError> {
        Config::from_lookup(&|key| vars.get(key).cloned())
    }

    #[test]
    fn loads_defaults_for_optional_values() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.use_secure_cookies);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.own_email, "owner@example.com");
        assert_eq!(config.blog_db_path(), PathBuf::from("/var/lib/blog/blog.db"));
    }

    #[test]
    fn missing_mail_credentials_fail_fast() {
        for key in ["EMAIL", "OWN_PASSWORD", "SESSION_SECRET_KEY", "DATABASE_PATH"] {
            let mut vars = base_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err().to_string();
            assert!(err.contains(key), "error for {} was: {}", key, err);
        }
    }

    #[test]
    fn rejects_short_session_key_and_relative_path() {
        let mut vars = base_vars();
        vars.insert("SESSION_SECRET_KEY", "abcd".to_string());
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("DATABASE_PATH", "data".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn smtp_overrides_are_applied() {
        let mut vars = base_vars();
        vars.insert("SMTP_HOST", "mail.example.com".to_string());
        vars.insert("SMTP_PORT", "2525".to_string());
        vars.insert("SMTP_TIMEOUT_SECS", "3".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.smtp.host, "mail.example.com");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.timeout_secs, 3);
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let mut vars = base_vars();
        vars.insert("BCRYPT_COST", "2".to_string());
        assert!(load(&vars).is_err());
    }
}
