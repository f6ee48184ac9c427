//! Request handlers.

pub mod crop;
pub mod health;
pub mod predictions;
pub mod uploads;

pub use crop::*;
pub use health::*;
pub use predictions::*;
pub use uploads::*;
