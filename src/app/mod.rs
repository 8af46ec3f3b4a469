//! Resource model handed to the host application: endpoints, their handlers, and the request and
//! status values that flow through them.

pub use error::ConfigError;
pub use method::Method;
pub use query::OptionValueQuery;
pub use registry::EndpointRegistry;
pub use request::Request;
pub use resource::{BoxedHandler, Resource};
pub use status::Status;

pub(crate) mod core_handler;
pub mod core_link;
pub mod error;
pub mod method;
pub(crate) mod observe;
pub mod query;
pub mod registry;
pub mod request;
pub mod resource;
pub mod status;
mod u24;
