use coap_lite::ResponseType;

/// Outcome of a handler: a response code plus an optional body.  The server attaches the
/// resource's content format and correlates it with the originating request.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    code: ResponseType,
    body: Vec<u8>,
}

impl Status {
    pub fn with_code(code: ResponseType, body: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            body: body.into(),
        }
    }

    /// 2.05 Content
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_code(ResponseType::Content, body)
    }

    /// 2.01 Created
    pub fn created(body: impl Into<Vec<u8>>) -> Self {
        Self::with_code(ResponseType::Created, body)
    }

    /// 2.04 Changed
    pub fn changed(body: impl Into<Vec<u8>>) -> Self {
        Self::with_code(ResponseType::Changed, body)
    }

    /// 2.02 Deleted
    pub fn deleted() -> Self {
        Self::with_code(ResponseType::Deleted, Vec::new())
    }

    /// 4.00 Bad Request
    pub fn bad_request() -> Self {
        Self::with_code(ResponseType::BadRequest, Vec::new())
    }

    /// 4.02 Bad Option
    pub fn bad_option() -> Self {
        Self::with_code(ResponseType::BadOption, Vec::new())
    }

    /// 4.04 Not Found
    pub fn not_found() -> Self {
        Self::with_code(ResponseType::NotFound, Vec::new())
    }

    /// 4.05 Method Not Allowed
    pub fn method_not_allowed() -> Self {
        Self::with_code(ResponseType::MethodNotAllowed, Vec::new())
    }

    /// 5.00 Internal Server Error
    pub fn internal_server_error() -> Self {
        Self::with_code(ResponseType::InternalServerError, Vec::new())
    }

    pub fn code(&self) -> ResponseType {
        self.code
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.code,
            ResponseType::Created
                | ResponseType::Deleted
                | ResponseType::Valid
                | ResponseType::Changed
                | ResponseType::Content
        )
    }
}
