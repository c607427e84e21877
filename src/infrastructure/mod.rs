pub mod bluetooth;
pub mod control;
pub mod logging;
