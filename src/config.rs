//! Command-line and environment configuration for the `bookstore` binary.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::Parser;

use crate::auth::AuthConfig;

#[derive(Debug, Parser)]
#[command(name = "bookstore", about = "Book catalog and review API")]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, env = "BOOKSTORE_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Secret used to sign bearer tokens. Changing it invalidates every issued token.
    #[arg(long, env = "BOOKSTORE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "BOOKSTORE_TOKEN_ISSUER", default_value = "bookstore")]
    pub token_issuer: String,

    /// How long a login token stays valid, in seconds.
    #[arg(long, env = "BOOKSTORE_TOKEN_LIFETIME_SECS", default_value_t = 7200)]
    pub token_lifetime_secs: u64,

    /// JSON file holding an array of books. Defaults to the bundled catalog.
    #[arg(long, env = "BOOKSTORE_CATALOG")]
    pub catalog: Option<PathBuf>,
}

impl Settings {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            auth_token_issuer: self.token_issuer.clone(),
            auth_token_secret: self.jwt_secret.clone(),
            auth_token_lifetime: Duration::from_secs(self.token_lifetime_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    // Parsing also reads the environment, so inspect the declared defaults directly.
    fn default_of(id: &str) -> Option<String> {
        Settings::command()
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == id)?
            .get_default_values()
            .first()
            .map(|value| value.to_string_lossy().into_owned())
    }

    #[test]
    fn declared_defaults() {
        assert_eq!(default_of("host").as_deref(), Some("127.0.0.1"));
        assert_eq!(default_of("port").as_deref(), Some("3000"));
        assert_eq!(default_of("token_issuer").as_deref(), Some("bookstore"));
        assert_eq!(default_of("token_lifetime_secs").as_deref(), Some("7200"));
        assert_eq!(default_of("jwt_secret"), None);
        assert_eq!(default_of("catalog"), None);
    }

    #[test]
    fn flags_build_auth_config() {
        let settings = Settings::try_parse_from([
            "bookstore",
            "--host",
            "0.0.0.0",
            "--port",
            "8081",
            "--jwt-secret",
            "s3cret",
            "--token-issuer",
            "shop",
            "--token-lifetime-secs",
            "60",
        ])
        .unwrap();

        assert_eq!(settings.port, 8081);
        assert_eq!(settings.host.to_string(), "0.0.0.0");

        let auth = settings.auth_config();
        assert_eq!(auth.auth_token_secret, "s3cret");
        assert_eq!(auth.auth_token_issuer, "shop");
        assert_eq!(auth.auth_token_lifetime, Duration::from_secs(60));
    }
}
