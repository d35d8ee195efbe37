use serde::{Deserialize, Serialize};

/// Connection parameters for the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseArgs {
    pub connection_uri: String,

    #[serde(default = "default_database_name")]
    pub database_name: String,
}

fn default_database_name() -> String {
    "jobwatch".to_string()
}
