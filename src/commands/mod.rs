pub mod account;
pub mod cloud;

pub use account::AccountCommand;
pub use cloud::{CloudCommand, CloudFields};
