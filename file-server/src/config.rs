use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the file server listens on
    pub port: u16,
    /// Directory holding one sub-directory per project
    pub root: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env_parse("NORA_PORT", 8080)?,
            root: match std::env::var("NORA_ROOT") {
                Ok(root) => PathBuf::from(root),
                Err(_) => default_root()?,
            },
        })
    }
}

/// `$HOME/Documents/Nora`, where the desktop build keeps its projects.
fn default_root() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; set NORA_ROOT explicitly"))?;
    Ok(PathBuf::from(home).join("Documents").join("Nora"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}
