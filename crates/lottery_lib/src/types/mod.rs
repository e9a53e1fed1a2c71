pub mod enums;
pub mod participant;
pub mod payment;
pub mod round;
pub mod winner;

pub use enums::*;
pub use participant::*;
pub use payment::*;
pub use round::*;
pub use winner::*;
