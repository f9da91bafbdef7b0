//! `KEY=VALUE` lists
//!
//! The list type used for creation options and for the items of a metadata domain.

use std::fmt::{Debug, Formatter};

use crate::errors::{RasterError, Result};

/// An ordered list of `KEY=VALUE` entries with case-insensitive keys.
///
/// This is the shape in which options are passed to
/// [`Driver::create_with_data_type`](crate::Driver::create_with_data_type) and friends.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NameValueList {
    entries: Vec<(String, String)>,
}

impl NameValueList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s, compared case-insensitively.
    ///
    /// Returns `Ok<()>` on success, `Err<RasterError>` if `name` is empty or has
    /// non alphanumeric characters, or `value` has newline characters.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RasterError::BadArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r', '\0']) {
            return Err(RasterError::BadArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Looks up the value corresponding to `key`.
    pub fn fetch_name_value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Determine the number of entries in the list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if the list has any values
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an iterator over the name/value elements of the list.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The entries formatted as `KEY=VALUE` strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl Debug for NameValueList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (k, v) in self.iter() {
            f.write_fmt(format_args!("{k}={v}\n"))?;
        }
        Ok(())
    }
}

/// Convenience shorthand for specifying an empty `NameValueList` to functions accepting
/// `Into<NameValueList>`.
impl From<()> for NameValueList {
    fn from(_: ()) -> Self {
        NameValueList::default()
    }
}

/// Creates a [`NameValueList`] from a slice of _key_/_value_ tuples.
///
/// Invalid pairs are logged and skipped.
impl<const N: usize> From<&[(&str, &str); N]> for NameValueList {
    fn from(pairs: &[(&str, &str); N]) -> Self {
        let mut result = Self::default();
        for (k, v) in pairs {
            if let Err(e) = result.set_name_value(k, v) {
                log::warn!("skipping option {k}={v}: {e}");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::cpl::NameValueList;
    use crate::errors::Result;

    fn fixture() -> Result<NameValueList> {
        let mut l = NameValueList::new();
        l.set_name_value("ONE", "1")?;
        l.set_name_value("TWO", "2")?;
        l.set_name_value("THREE", "3")?;

        Ok(l)
    }

    #[test]
    fn basic_list() -> Result<()> {
        let l = fixture()?;
        assert_eq!(l.fetch_name_value("ONE"), Some("1"));
        assert_eq!(l.fetch_name_value("three"), Some("3"));
        assert_eq!(l.fetch_name_value("FOO"), None);

        Ok(())
    }

    #[test]
    fn overwrites_case_insensitively() -> Result<()> {
        let mut l = fixture()?;
        l.set_name_value("two", "deux")?;
        assert_eq!(l.len(), 3);
        assert_eq!(l.fetch_name_value("TWO"), Some("deux"));

        Ok(())
    }

    #[test]
    fn can_be_empty() -> Result<()> {
        let l = NameValueList::new();
        assert!(l.is_empty());

        let l = fixture()?;
        assert!(!l.is_empty());

        Ok(())
    }

    #[test]
    fn has_iterator() -> Result<()> {
        let f = fixture()?;
        let mut it = f.iter();
        assert_eq!(it.next(), Some(("ONE", "1")));
        assert_eq!(it.next(), Some(("TWO", "2")));
        assert_eq!(it.next(), Some(("THREE", "3")));
        assert_eq!(it.next(), None);
        assert_eq!(f.to_strings(), vec!["ONE=1", "TWO=2", "THREE=3"]);
        Ok(())
    }

    #[test]
    fn invalid_keys() -> Result<()> {
        let mut l = fixture()?;
        assert!(l.set_name_value("l==t", "2").is_err());
        assert!(l.set_name_value("", "2").is_err());
        assert!(l.set_name_value("foo", "2\n4\r5").is_err());

        let l = NameValueList::from(&[("INTERLEAVE", "PIXEL"), ("A=B", "C")]);
        assert_eq!(l.len(), 1);

        Ok(())
    }

    #[test]
    fn debug_fmt() -> Result<()> {
        let l = fixture()?;
        let s = format!("{l:?}");
        assert!(s.contains("ONE=1"));
        assert!(s.contains("TWO=2"));
        assert!(s.contains("THREE=3"));

        Ok(())
    }
}
