use std::fmt::{self, Debug};

use coap_lite::ContentFormat;

use crate::app::observe::ObserveHandler;
use crate::app::{Method, Request, Status};

/// Boxed handler stored in a resource's method slot.  Handlers run synchronously on the same
/// execution context as [`crate::CoapServer::process`] and must not block.
pub type BoxedHandler<Endpoint> = Box<dyn FnMut(&Request<Endpoint>) -> Status>;

/// Named addressable unit exposing up to one handler per [`Method`].  Obtained from
/// [`crate::CoapServer::create_endpoint`] and configured in place:
///
/// ```no_run
/// # use coap_lite::ContentFormat;
/// # use coap_thing_server::app::Status;
/// # use coap_thing_server::CoapServer;
/// let mut server = CoapServer::<std::net::SocketAddr>::new();
/// server
///     .create_endpoint("LED", ContentFormat::TextPlain, true)?
///     .on_get(|_request| Status::ok("Off"));
/// # Ok::<(), coap_thing_server::app::ConfigError>(())
/// ```
pub struct Resource<Endpoint> {
    name: String,
    content_format: ContentFormat,
    observable: bool,
    handlers: [Option<BoxedHandler<Endpoint>>; 4],
    pub(crate) observe_handler: Option<ObserveHandler<Endpoint>>,
}

impl<Endpoint: Debug + Clone + PartialEq> Resource<Endpoint> {
    pub(crate) fn new(name: &str, content_format: ContentFormat, observable: bool) -> Self {
        Self {
            name: name.to_string(),
            content_format,
            observable,
            handlers: [None, None, None, None],
            observe_handler: observable.then(ObserveHandler::new),
        }
    }

    /// Set a request handler for "Get" requests.
    pub fn on_get<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&Request<Endpoint>) -> Status + 'static,
    {
        self.on_method(Method::Get, handler)
    }

    /// Set a request handler for "Post" requests.
    pub fn on_post<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&Request<Endpoint>) -> Status + 'static,
    {
        self.on_method(Method::Post, handler)
    }

    /// Set a request handler for "Put" requests.
    pub fn on_put<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&Request<Endpoint>) -> Status + 'static,
    {
        self.on_method(Method::Put, handler)
    }

    /// Set a request handler for "Delete" requests.
    pub fn on_delete<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&Request<Endpoint>) -> Status + 'static,
    {
        self.on_method(Method::Delete, handler)
    }

    /// Set a request handler for an arbitrary method, replacing any handler already bound.
    pub fn on_method<F>(&mut self, method: Method, handler: F) -> &mut Self
    where
        F: FnMut(&Request<Endpoint>) -> Status + 'static,
    {
        self.handlers[method.slot()] = Some(Box::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_format(&self) -> ContentFormat {
        self.content_format
    }

    pub fn is_observable(&self) -> bool {
        self.observable
    }

    /// Whether an observer is currently registered.
    pub fn has_observer(&self) -> bool {
        self.observe_handler
            .as_ref()
            .map_or(false, |h| h.subscriber().is_some())
    }

    pub fn handles(&self, method: Method) -> bool {
        self.handlers[method.slot()].is_some()
    }

    /// Methods with a bound handler, in [`Method::ALL`] order.
    pub fn methods(&self) -> Vec<Method> {
        Method::ALL.into_iter().filter(|m| self.handles(*m)).collect()
    }

    /// Run the handler bound for the request's method, or yield 4.05 without invoking anything.
    pub(crate) fn handle(&mut self, request: &Request<Endpoint>) -> Status {
        match self.handlers[request.method().slot()].as_mut() {
            Some(handler) => handler(request),
            None => Status::method_not_allowed(),
        }
    }
}

impl<Endpoint> Debug for Resource<Endpoint> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<_> = Method::ALL
            .into_iter()
            .filter(|m| self.handlers[m.slot()].is_some())
            .collect();
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("content_format", &self.content_format)
            .field("observable", &self.observable)
            .field("handlers", &bound)
            .finish()
    }
}
