#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub pesapal: Pesapal,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Pesapal {
    pub test_mode: bool,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback_url: String,
    /// Notification id returned by the IPN registration endpoint. Absent
    /// until the operator registers the IPN URL and persists the id.
    pub ipn_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserSecret {
    pub secret: String,
}
