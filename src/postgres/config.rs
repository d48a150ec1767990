use crate::error::TemplateError;

/// Connection options for a Postgres session.
///
/// All five fields are required; [`PostgresOptions::validate`] reports the first one
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl PostgresOptions {
    #[must_use]
    pub fn builder() -> PostgresOptionsBuilder {
        PostgresOptionsBuilder::default()
    }

    /// Read `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USERNAME` and `DB_PASSWORD` from the
    /// process environment.
    ///
    /// Only the live environment is consulted; nothing reads a `.env` file. An
    /// application that keeps these settings in one must load it into the
    /// environment before calling this, or parse it itself and go through
    /// [`PostgresOptions::from_lookup`].
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if a variable is missing or `DB_PORT` is not
    /// a port number.
    pub fn from_env() -> Result<Self, TemplateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`PostgresOptions::from_env`], reading through `lookup` instead.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if a variable is missing or `DB_PORT` is not
    /// a port number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TemplateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("DB_PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                TemplateError::ConfigError(format!("DB_PORT '{raw}' is not a port: {e}"))
            })?),
            None => None,
        };
        let opts = PostgresOptions {
            host: lookup("DB_HOST"),
            port,
            dbname: lookup("DB_NAME"),
            user: lookup("DB_USERNAME"),
            password: lookup("DB_PASSWORD"),
        };
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    /// Returns `TemplateError::ConfigError` naming the first missing field.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.dbname.is_none() {
            return Err(TemplateError::ConfigError(
                "dbname is required".to_string(),
            ));
        }
        if self.host.is_none() {
            return Err(TemplateError::ConfigError("host is required".to_string()));
        }
        if self.port.is_none() {
            return Err(TemplateError::ConfigError("port is required".to_string()));
        }
        if self.user.is_none() {
            return Err(TemplateError::ConfigError("user is required".to_string()));
        }
        if self.password.is_none() {
            return Err(TemplateError::ConfigError(
                "password is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Translate into a `tokio_postgres` configuration.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if a required field is missing.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, TemplateError> {
        self.validate()?;
        let mut cfg = tokio_postgres::Config::new();
        if let Some(host) = &self.host {
            cfg.host(host);
        }
        if let Some(port) = self.port {
            cfg.port(port);
        }
        if let Some(dbname) = &self.dbname {
            cfg.dbname(dbname);
        }
        if let Some(user) = &self.user {
            cfg.user(user);
        }
        if let Some(password) = &self.password {
            cfg.password(password);
        }
        Ok(cfg)
    }
}

/// Fluent builder for [`PostgresOptions`].
#[derive(Debug, Clone, Default)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = Some(port);
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.opts.dbname = Some(dbname.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.opts.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }

    /// Validate and build a connector.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if a required field is missing.
    pub fn build(self) -> Result<super::PostgresConnector, TemplateError> {
        super::PostgresConnector::new(self.finish())
    }
}
