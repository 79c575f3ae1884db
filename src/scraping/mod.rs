pub mod browser_manager;
pub mod dynamic;
pub mod navigation;
pub mod session;

pub use browser_manager::{BrowserSettings, ChromiumLauncher};
pub use navigation::{NavigationPlan, NavigationStrategy, WaitCondition};
pub use session::{BrowserSession, SessionLauncher};
