mod client;
mod errors;
mod page;
mod user_agent;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::page::{Page, CHALLENGE_TITLE_MARKERS};
pub use self::user_agent::get_user_agent;
