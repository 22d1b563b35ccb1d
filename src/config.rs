use log::warn;

/// Runtime settings for the gateway, read once at startup.
///
/// Every field has a default so the binary starts with no configuration at
/// all. Database credentials are fixed for the process lifetime; only the
/// database *name* is chosen per connection through the API.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    /// HTTP listen port.
    pub port: u16,
    /// When set, only read statements are forwarded to the database.
    pub read_only: bool,
    /// Upper bound on rows returned per query. Zero disables the cap.
    pub max_rows: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: 3306,
            db_user: "root".to_string(),
            db_password: String::new(),
            port: 5001,
            read_only: false,
            max_rows: 10_000,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Tests use this
    /// instead of mutating process environment.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            db_host: get("DB_HOST").unwrap_or(defaults.db_host),
            db_port: parse_or(&get, "DB_PORT", defaults.db_port),
            db_user: get("DB_USER").unwrap_or(defaults.db_user),
            db_password: get("DB_PASSWORD").unwrap_or(defaults.db_password),
            port: parse_or(&get, "PORT", defaults.port),
            read_only: get("READ_ONLY")
                .map(|raw| is_truthy(&raw))
                .unwrap_or(defaults.read_only),
            max_rows: parse_or(&get, "MAX_ROWS", defaults.max_rows),
        }
    }
}

/// Parse a numeric variable, keeping the default (with a warning) when the
/// value does not parse. A typo in `.env` should not stop the server.
fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match get(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring {}={:?}, using default {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
