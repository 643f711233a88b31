use anyhow::{Ok, Result};

use super::config_model::{Database, DotEnvyConfig, Pesapal, Server, UserSecret};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let pesapal = Pesapal {
        test_mode: std::env::var("PESAPAL_TEST_MODE")
            .map(|value| matches!(value.as_str(), "1" | "true" | "True"))
            .unwrap_or(true),
        consumer_key: std::env::var("PESAPAL_CONSUMER_KEY")
            .expect("PESAPAL_CONSUMER_KEY is invalid"),
        consumer_secret: std::env::var("PESAPAL_CONSUMER_SECRET")
            .expect("PESAPAL_CONSUMER_SECRET is invalid"),
        callback_url: std::env::var("PESAPAL_CALLBACK_URL")
            .expect("PESAPAL_CALLBACK_URL is invalid"),
        ipn_id: std::env::var("PESAPAL_IPN_ID")
            .ok()
            .filter(|value| !value.is_empty()),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        pesapal,
    })
}

pub fn get_user_secret() -> Result<UserSecret> {
    dotenvy::dotenv().ok();

    Ok(UserSecret {
        secret: std::env::var("JWT_USER_SECRET").expect("JWT_USER_SECRET is invalid"),
    })
}
