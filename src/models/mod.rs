pub mod analysis;
pub mod event;
pub mod lenient;
pub mod request;

pub use analysis::*;
pub use event::*;
pub use request::*;
