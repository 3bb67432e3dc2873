pub mod bus;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod logging;
pub mod page;
pub mod summary;
pub mod synthesis;
pub mod ui;
pub mod util;
pub mod worker;
