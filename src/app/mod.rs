pub mod session;
pub mod terminal;

pub use session::{parse_intent, SessionIntent};
pub use terminal::TerminalPresenter;
