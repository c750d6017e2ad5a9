pub mod config;
pub mod countries;
pub mod error;
pub mod types;

pub use config::Config;
pub use countries::country_display_name;
pub use error::{Result, ThreatwireError};
pub use types::{NewAttack, NewVictim, NewsItem, RawAttack, RawVictim, RecordKind};
