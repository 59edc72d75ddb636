//! Request handlers for counter operations.

mod count;
mod increment;
mod reset;
mod values;

pub use count::*;
pub use increment::*;
pub use reset::*;
pub use values::*;
