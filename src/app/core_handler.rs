use std::collections::HashMap;
use std::fmt::Debug;

use coap_lite::ContentFormat;
use log::warn;

use crate::app::core_link::CoreLink;
use crate::app::{EndpointRegistry, Method, Request, Status};

pub const WELL_KNOWN_CORE: &str = ".well-known/core";

#[derive(Debug, Clone)]
struct DiscoverableResource {
    /// Preformatted individual link so that the listing is just a join by ",".
    link_str: String,
    attributes_as_string: HashMap<&'static str, String>,
}

/// Answers `GET /.well-known/core` with the CoRE link-format listing of every registered
/// resource.  The listing is captured when the server starts since the registry is fixed from
/// then on.
#[derive(Debug, Clone)]
pub struct CoreRequestHandler {
    resources: Vec<DiscoverableResource>,
}

impl CoreRequestHandler {
    pub fn from_registry<Endpoint: Debug + Clone + PartialEq>(
        registry: &EndpointRegistry<Endpoint>,
    ) -> Self {
        let resources = registry
            .iter()
            .filter_map(|resource| {
                let link = CoreLink::from(resource);
                match link.format_single_link() {
                    Ok(link_str) => Some(DiscoverableResource {
                        link_str,
                        attributes_as_string: link.attributes_as_string(),
                    }),
                    Err(e) => {
                        warn!("Unable to format link for {}: {e}", resource.name());
                        None
                    }
                }
            })
            .collect();
        Self { resources }
    }

    pub fn content_format(&self) -> ContentFormat {
        ContentFormat::ApplicationLinkFormat
    }

    pub fn handle<Endpoint>(&self, request: &Request<Endpoint>) -> Status {
        if request.method() != Method::Get {
            return Status::method_not_allowed();
        }
        let queries = request_get_queries(request);
        let body = self
            .resources
            .iter()
            .filter(|&r| filter_by_query(r, &queries))
            .map(|r| r.link_str.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Status::ok(body)
    }
}

fn request_get_queries<Endpoint>(request: &Request<Endpoint>) -> HashMap<String, String> {
    request
        .queries()
        .iter()
        .map(|query| (query.key.clone(), query.value.clone()))
        .collect()
}

fn filter_by_query(resource: &DiscoverableResource, queries: &HashMap<String, String>) -> bool {
    for (key, value) in queries {
        if Some(value) != resource.attributes_as_string.get(key.as_str()) {
            return false;
        }
    }
    true
}
