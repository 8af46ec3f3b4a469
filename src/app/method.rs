use std::fmt;

use coap_lite::RequestType;

/// Request methods a resource can bind handlers for.  The set is fixed by design: each resource
/// carries exactly one handler slot per variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub(crate) fn slot(self) -> usize {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Delete => 3,
        }
    }
}

impl TryFrom<RequestType> for Method {
    type Error = RequestType;

    fn try_from(t: RequestType) -> Result<Self, Self::Error> {
        match t {
            RequestType::Get => Ok(Method::Get),
            RequestType::Post => Ok(Method::Post),
            RequestType::Put => Ok(Method::Put),
            RequestType::Delete => Ok(Method::Delete),
            other => Err(other),
        }
    }
}

impl From<Method> for RequestType {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => RequestType::Get,
            Method::Post => RequestType::Post,
            Method::Put => RequestType::Put,
            Method::Delete => RequestType::Delete,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_distinct() {
        let mut slots: Vec<_> = Method::ALL.iter().map(|m| m.slot()).collect();
        slots.dedup();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unsupported_request_types() {
        assert!(matches!(Method::try_from(RequestType::Post), Ok(Method::Post)));
        assert!(Method::try_from(RequestType::Fetch).is_err());
        assert!(Method::try_from(RequestType::IPatch).is_err());
    }
}
