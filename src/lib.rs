pub mod config;
pub mod logging;
pub mod schedule;
pub mod session;
pub mod status;
pub mod platform {
    #[cfg(windows)]
    pub mod instance;
    pub mod lock;
    pub mod power;
    #[cfg(windows)]
    pub mod shell;
}
pub mod tasks {
    pub mod poller;
    pub mod shutdown;
}
#[cfg(windows)]
pub mod tray;
