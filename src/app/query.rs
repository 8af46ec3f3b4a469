use std::fmt;

use coap_lite::error::IncompatibleOptionValueFormat;
use coap_lite::option_value::OptionValueType;

/// Uri-Query option split into `key=value`.  A bare `key` (as in `?obs`) carries an empty value so
/// that it matches flag-style link attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValueQuery {
    pub key: String,
    pub value: String,
}

impl OptionValueQuery {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<OptionValueQuery> for Vec<u8> {
    fn from(option_value: OptionValueQuery) -> Self {
        option_value.to_string().into_bytes()
    }
}

impl TryFrom<Vec<u8>> for OptionValueQuery {
    type Error = IncompatibleOptionValueFormat;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let query = String::from_utf8(value).map_err(|e| IncompatibleOptionValueFormat {
            message: format!("query is not UTF-8: {e}"),
        })?;
        let (key, value) = query.split_once('=').unwrap_or((query.as_str(), ""));
        Ok(Self::new(key, value))
    }
}

impl OptionValueType for OptionValueQuery {}

impl fmt::Display for OptionValueQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value() {
        let query = OptionValueQuery::try_from(b"ct=0".to_vec()).unwrap();
        assert_eq!(query, OptionValueQuery::new("ct", "0"));
    }

    #[test]
    fn test_bare_key_has_empty_value() {
        let query = OptionValueQuery::try_from(b"obs".to_vec()).unwrap();
        assert_eq!(query, OptionValueQuery::new("obs", ""));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let query = OptionValueQuery::try_from(b"rt=a=b".to_vec()).unwrap();
        assert_eq!(query, OptionValueQuery::new("rt", "a=b"));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(OptionValueQuery::try_from(vec![0xff, b'=', b'1']).is_err());
    }
}
