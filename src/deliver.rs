pub mod dispatcher;
pub mod edit_sync;

pub use dispatcher::{Delivery, Dispatcher};
