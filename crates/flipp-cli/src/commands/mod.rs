pub mod catalog;
pub mod dispatch;
pub mod process;
pub mod solve;
