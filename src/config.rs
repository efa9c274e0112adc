// Runtime settings, read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub github_client_id: String,
    /// OAuth is disabled until this is set.
    pub github_client_secret: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3001);
        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./db/dstack.db"));
        let github_client_id =
            std::env::var("GITHUB_CLIENT_ID").unwrap_or_else(|_| String::new());
        let github_client_secret = std::env::var("GITHUB_CLIENT_SECRET").ok();

        Settings {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database_path,
            github_client_id,
            github_client_secret,
        }
    }
}
