pub mod app;
pub mod notifications;
pub mod terminal;
pub mod text_input;
pub mod theme;
pub mod views;

pub use app::{App, AppEvent, InputMode};
pub use terminal::{init as init_terminal, restore as restore_terminal, Tui};

/// Width of the navigation sidebar
pub const SIDEBAR_WIDTH: u16 = 26;

/// Horizontal padding inside the main content area
pub const CONTENT_PADDING_H: u16 = 2;
