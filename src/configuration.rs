use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token issuance settings.
///
/// The signing secret has no compiled-in default: it must come from the
/// configuration file or the `APP__AUTH__SECRET` environment variable,
/// and startup fails if it is missing or empty.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub access_token_ttl_seconds: i64,  // e.g. 900 for 15 minutes
    pub refresh_token_ttl_seconds: i64, // e.g. 2592000 for 30 days
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;

    if settings.auth.secret.trim().is_empty() {
        return Err(ConfigError::Message(
            "auth.secret must be set to a non-empty value".to_string(),
        ));
    }

    Ok(settings)
}
