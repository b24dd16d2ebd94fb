use clap::Parser;
use std::net::SocketAddr;
use strum_macros::{Display, EnumString};

pub const LISTEN: &str = "127.0.0.1:8080";
pub const DATABASE_URL: &str = "sqlite::memory:";

/// Which backend holds the students.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    /// Process memory; everything is lost on restart.
    #[default]
    Memory,
    /// A SQLite database at `--database-url`.
    Sqlite,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The address to listen on
    #[arg(short, long, env = "ROLLCALL_LISTEN", default_value = LISTEN)]
    pub listen: SocketAddr,

    /// The backend to keep students in: `memory` or `sqlite`
    #[arg(short, long, env = "ROLLCALL_STORE", default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// SQLite connection URL, only used with `--store sqlite`
    #[arg(long, env = "DATABASE_URL", default_value = DATABASE_URL)]
    pub database_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreKind::default(),
            database_url: DATABASE_URL.to_string(),
        }
    }
}
