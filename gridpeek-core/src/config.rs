//! Database connection configuration.
//!
//! Settings are read from the environment once at startup and passed down
//! explicitly; nothing in this crate reads the environment after that.
//! The connection string is rendered in ADO.NET form for the TDS client.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Driver name kept for parity with ODBC-based deployments. The TDS client
/// speaks the wire protocol natively, so the value is informational only.
pub const DEFAULT_DRIVER: &str = "ODBC Driver 17 for SQL Server";

/// Fixed connection-establishment timeout. No other timeout or retry logic
/// exists anywhere in the system.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// AUTH MODE
// ============================================================================

/// How the viewer authenticates against SQL Server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Integrated credentials of the hosting process.
    Trusted,
    /// Explicit username and password.
    SqlAuth,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" => Ok(AuthMode::Trusted),
            "sql_auth" => Ok(AuthMode::SqlAuth),
            other => Err(ConfigError::InvalidValue {
                field: "DB_AUTH_MODE".to_string(),
                value: other.to_string(),
                reason: "must be 'trusted' or 'sql_auth'".to_string(),
            }),
        }
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// Server address, optionally `host\instance` or `host,port`.
    pub server: String,
    /// Database name.
    pub database: String,
    /// Authentication mode.
    pub auth_mode: AuthMode,
    /// ODBC driver name carried for display/compatibility.
    pub driver: String,
    /// Username, required for sql_auth.
    pub username: Option<String>,
    /// Password, required for sql_auth.
    pub password: Option<String>,
    /// Connection-establishment timeout.
    pub connect_timeout: Duration,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            server: String::new(),
            database: String::new(),
            auth_mode: AuthMode::Trusted,
            driver: DEFAULT_DRIVER.to_string(),
            username: None,
            password: None,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl DbSettings {
    /// Read settings from environment variables.
    ///
    /// Environment variables:
    /// - `DB_SERVER`: server address (required)
    /// - `DB_DATABASE`: database name (required)
    /// - `DB_AUTH_MODE`: "trusted" or "sql_auth" (default: trusted)
    /// - `DB_DRIVER`: driver name (default: ODBC Driver 17 for SQL Server)
    /// - `DB_USERNAME` / `DB_PASSWORD`: credentials, required iff sql_auth
    ///
    /// Presence of the required values is checked by `connection_string`,
    /// not here, so a partially configured process still fails before any
    /// network call is attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_mode = std::env::var("DB_AUTH_MODE")
            .unwrap_or_else(|_| "trusted".to_string())
            .parse()?;

        Ok(Self {
            server: std::env::var("DB_SERVER").unwrap_or_default(),
            database: std::env::var("DB_DATABASE").unwrap_or_default(),
            auth_mode,
            driver: std::env::var("DB_DRIVER")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DRIVER.to_string()),
            username: std::env::var("DB_USERNAME").ok(),
            password: std::env::var("DB_PASSWORD").ok(),
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    /// Render the connection string consumed by the database client.
    ///
    /// Fails with `ConfigError` when a required value is absent or blank.
    /// sql_auth requires username and password; trusted requires neither.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        let server = normalize_server(&require(&self.server, "DB_SERVER")?);
        let database = require(&self.database, "DB_DATABASE")?;

        let mut parts = vec![
            format!("Driver={{{}}}", self.driver),
            format!("Server={}", server),
            format!("Database={}", database),
            "TrustServerCertificate=true".to_string(),
        ];

        match self.auth_mode {
            AuthMode::Trusted => {
                parts.push("IntegratedSecurity=true".to_string());
            }
            AuthMode::SqlAuth => {
                let username = require(self.username.as_deref().unwrap_or(""), "DB_USERNAME")?;
                let password = require(self.password.as_deref().unwrap_or(""), "DB_PASSWORD")?;
                parts.push(format!("User ID={}", username));
                parts.push(format!("Password={}", password));
            }
        }

        Ok(parts.join(";"))
    }
}

/// Collapse doubled backslashes copied from escaped env files, e.g.
/// `HOST\\\\SQLEXPRESS` pasted from a `.env` into `HOST\SQLEXPRESS`.
fn normalize_server(server: &str) -> String {
    server.replace("\\\\", "\\").trim().to_string()
}

fn require(value: &str, field: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingRequired {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DbSettings {
        DbSettings {
            server: "db01".to_string(),
            database: "inventory".to_string(),
            ..DbSettings::default()
        }
    }

    #[test]
    fn test_trusted_connection_string() {
        let conn = settings().connection_string().unwrap();
        assert!(conn.contains("Server=db01"));
        assert!(conn.contains("Database=inventory"));
        assert!(conn.contains("IntegratedSecurity=true"));
        assert!(conn.contains("TrustServerCertificate=true"));
        assert!(!conn.contains("Password="));
    }

    #[test]
    fn test_sql_auth_connection_string() {
        let mut s = settings();
        s.auth_mode = AuthMode::SqlAuth;
        s.username = Some("app".to_string());
        s.password = Some("secret".to_string());

        let conn = s.connection_string().unwrap();
        assert!(conn.contains("User ID=app"));
        assert!(conn.contains("Password=secret"));
        assert!(!conn.contains("IntegratedSecurity"));
    }

    #[test]
    fn test_sql_auth_missing_password_fails() {
        let mut s = settings();
        s.auth_mode = AuthMode::SqlAuth;
        s.username = Some("app".to_string());

        let err = s.connection_string().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired {
                field: "DB_PASSWORD".to_string()
            }
        );
    }

    #[test]
    fn test_blank_server_fails() {
        let mut s = settings();
        s.server = "   ".to_string();

        let err = s.connection_string().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequired {
                field: "DB_SERVER".to_string()
            }
        );
    }

    #[test]
    fn test_server_backslash_normalization() {
        let mut s = settings();
        s.server = "HOST\\\\SQLEXPRESS".to_string();

        let conn = s.connection_string().unwrap();
        assert!(conn.contains("Server=HOST\\SQLEXPRESS"));
    }

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!("trusted".parse::<AuthMode>().unwrap(), AuthMode::Trusted);
        assert_eq!("SQL_AUTH".parse::<AuthMode>().unwrap(), AuthMode::SqlAuth);
        assert!(" Trusted ".parse::<AuthMode>().is_ok());
        assert!("kerberos".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_driver_clause_present() {
        let conn = settings().connection_string().unwrap();
        assert!(conn.starts_with("Driver={ODBC Driver 17 for SQL Server}"));
    }
}
