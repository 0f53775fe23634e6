use std::{
    env,
    fmt::{Debug, Display},
    path::PathBuf,
    str::FromStr,
};

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_file: PathBuf,
}

impl Config {
    /// Reads `HOST`, `PORT` and `DB_FILE` from the environment
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: try_load(&lookup, "HOST", "127.0.0.1".to_string()),
            port: try_load(&lookup, "PORT", 3001),
            db_file: try_load(&lookup, "DB_FILE", PathBuf::from("db.json")),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        log::info!("{key} not set, using default: {default:?}");
        return default;
    };
    raw.parse().unwrap_or_else(|err| {
        log::warn!("Invalid {key} value {raw:?}: {err}, using default: {default:?}");
        default
    })
}
