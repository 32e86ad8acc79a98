use std::env;

pub const ENV_OT_API_KEY: &str = "OT_API_KEY";
pub const ENV_OT_DATA_ACCESS_ADMIN_GROUP: &str = "OT_DATA_ACCESS_ADMIN_GROUP";

/// Source of the credentials the Origin Trials API requires.
///
/// Every client operation asks for the key on each call, so implementations
/// may rotate secrets without rebuilding the client.
pub trait SecretsProvider: Send + Sync {
    fn ot_api_key(&self) -> Option<String>;
    fn ot_data_access_admin_group(&self) -> Option<String>;
}

/// Reads secrets from process environment variables. Blank values count as unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretsProvider for EnvSecrets {
    fn ot_api_key(&self) -> Option<String> {
        env_non_empty(ENV_OT_API_KEY)
    }

    fn ot_data_access_admin_group(&self) -> Option<String> {
        env_non_empty(ENV_OT_DATA_ACCESS_ADMIN_GROUP)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaticSecrets {
    api_key: Option<String>,
    data_access_admin_group: Option<String>,
}

impl StaticSecrets {
    #[must_use]
    pub fn new(api_key: Option<String>, data_access_admin_group: Option<String>) -> Self {
        Self {
            api_key: api_key.and_then(non_empty),
            data_access_admin_group: data_access_admin_group.and_then(non_empty),
        }
    }
}

impl SecretsProvider for StaticSecrets {
    fn ot_api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    fn ot_data_access_admin_group(&self) -> Option<String> {
        self.data_access_admin_group.clone()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
