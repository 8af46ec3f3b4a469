use std::collections::HashMap;
use std::fmt::{Debug, Error, Write};

use coap_lite::link_format::{
    LinkAttributeWrite, LinkFormatWrite, LINK_ATTR_CONTENT_FORMAT, LINK_ATTR_OBSERVABLE,
};

use crate::app::Resource;

/// CoRE link (RFC 6690) describing a single resource for the `/.well-known/core` listing.
#[derive(Default, Debug, Clone)]
pub struct CoreLink {
    path: String,
    attributes: Vec<(&'static str, LinkAttributeValue)>,
}

#[derive(Debug, Clone)]
enum LinkAttributeValue {
    Quoted(String),
    Number(u32),
    Flag,
}

impl LinkAttributeValue {
    fn format_for_comparison(&self) -> String {
        match self {
            Self::Quoted(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Flag => String::new(),
        }
    }

    fn write_to<'a, 'b, T: Write>(
        &self,
        write: LinkAttributeWrite<'a, 'b, T>,
        key: &str,
    ) -> LinkAttributeWrite<'a, 'b, T> {
        match self {
            Self::Quoted(value) => write.attr_quoted(key, value),
            Self::Number(value) => write.attr_u32(key, *value),
            Self::Flag => write.attr(key, ""),
        }
    }
}

impl CoreLink {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn attr_quoted(&mut self, key: &'static str, value: &str) -> &mut Self {
        self.attributes
            .push((key, LinkAttributeValue::Quoted(value.to_string())));
        self
    }

    pub fn attr_u32(&mut self, key: &'static str, value: u32) -> &mut Self {
        self.attributes.push((key, LinkAttributeValue::Number(value)));
        self
    }

    pub fn attr_flag(&mut self, key: &'static str) -> &mut Self {
        self.attributes.push((key, LinkAttributeValue::Flag));
        self
    }

    pub fn format_single_link(&self) -> Result<String, Error> {
        let mut buf = String::new();
        let mut write = LinkFormatWrite::new(&mut buf);
        write = self.write_link(write)?;
        write.finish()?;
        Ok(buf)
    }

    fn write_link<'a>(
        &self,
        mut write: LinkFormatWrite<'a, String>,
    ) -> Result<LinkFormatWrite<'a, String>, Error> {
        let mut link = write.link(&self.path);
        for (key, value) in &self.attributes {
            link = value.write_to(link, key);
        }
        link.finish().map(|_| write)
    }

    /// Attribute values rendered as plain strings so that they can be compared against query
    /// filters like `GET /.well-known/core?ct=0`.
    pub fn attributes_as_string(&self) -> HashMap<&'static str, String> {
        self.attributes
            .iter()
            .map(|(k, v)| (*k, v.format_for_comparison()))
            .collect()
    }
}

impl<Endpoint: Debug + Clone + PartialEq> From<&Resource<Endpoint>> for CoreLink {
    fn from(resource: &Resource<Endpoint>) -> Self {
        let mut link = CoreLink::new(&format!("/{}", resource.name()));
        if let Ok(ct) = u32::try_from(usize::from(resource.content_format())) {
            link.attr_u32(LINK_ATTR_CONTENT_FORMAT, ct);
        }
        if resource.is_observable() {
            link.attr_flag(LINK_ATTR_OBSERVABLE);
        }
        link
    }
}
