use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterIpnModel {
    pub callback_url: Option<String>,
}
