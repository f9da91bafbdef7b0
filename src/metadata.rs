use crate::cpl::NameValueList;
use crate::errors::Result;

/// Description and `KEY=VALUE` items grouped by domain.
///
/// The default domain is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    description: String,
    domains: Vec<(String, NameValueList)>,
}

impl MetadataStore {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    pub fn domains(&self) -> Vec<String> {
        self.domains
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(domain, _)| domain.clone())
            .collect()
    }

    pub fn domain(&self, domain: &str) -> Option<&NameValueList> {
        self.domains
            .iter()
            .find(|(d, _)| d.eq_ignore_ascii_case(domain))
            .map(|(_, items)| items)
    }

    pub fn item(&self, key: &str, domain: &str) -> Option<&str> {
        self.domain(domain)?.fetch_name_value(key)
    }

    pub fn set_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()> {
        match self
            .domains
            .iter_mut()
            .find(|(d, _)| d.eq_ignore_ascii_case(domain))
        {
            Some((_, items)) => items.set_name_value(key, value),
            None => {
                let mut items = NameValueList::new();
                items.set_name_value(key, value)?;
                self.domains.push((domain.to_string(), items));
                Ok(())
            }
        }
    }
}

pub(crate) mod sealed {
    use super::MetadataStore;
    use crate::errors::Result;

    /// Access to the store behind a [`Metadata`](super::Metadata) implementor.
    ///
    /// `f` runs while the owning dataset is borrowed, so it must not reach
    /// back into the dataset.
    pub trait MetadataAccess {
        fn with_metadata<R>(&self, f: impl FnOnce(&MetadataStore) -> R) -> Result<R>;

        fn with_metadata_mut<R>(&mut self, f: impl FnOnce(&mut MetadataStore) -> R) -> Result<R>;
    }
}

/// Metadata of a [`Dataset`](crate::Dataset) or [`RasterBand`](crate::raster::RasterBand).
///
/// Items are stored and returned as given; nothing here is interpreted by pixel I/O.
/// The trait is implemented by this crate's types only.
///
/// ```
/// use memraster::{DriverManager, Metadata};
///
/// let driver = DriverManager::get_driver_by_name("MEM").unwrap();
/// let mut dataset = driver.create(4, 4, 1).unwrap();
/// dataset.set_metadata_item("AREA_OR_POINT", "Point", "").unwrap();
/// let band = dataset.rasterband(1).unwrap();
/// assert_eq!(band.metadata_item("AREA_OR_POINT", ""), None);
/// assert_eq!(dataset.metadata_item("area_or_point", ""), Some("Point".to_string()));
/// ```
///
/// The underlying store is not reachable from outside the crate:
///
/// ```compile_fail
/// use memraster::{DriverManager, Metadata};
///
/// let driver = DriverManager::get_driver_by_name("MEM").unwrap();
/// let dataset = driver.create(4, 4, 1).unwrap();
/// let _ = dataset.with_metadata(|md| md.description().len());
/// ```
pub trait Metadata: sealed::MetadataAccess {
    fn description(&self) -> Result<String> {
        self.with_metadata(|md| md.description().to_string())
    }

    fn set_description(&mut self, description: &str) -> Result<()> {
        self.with_metadata_mut(|md| md.set_description(description))
    }

    /// Domains holding at least one item.
    fn metadata_domains(&self) -> Vec<String> {
        self.with_metadata(|md| md.domains()).unwrap_or_default()
    }

    /// All items of `domain` as `KEY=VALUE` strings.
    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>> {
        self.with_metadata(|md| md.domain(domain).map(NameValueList::to_strings))
            .ok()
            .flatten()
    }

    fn metadata_item(&self, key: &str, domain: &str) -> Option<String> {
        self.with_metadata(|md| md.item(key, domain).map(str::to_string))
            .ok()
            .flatten()
    }

    fn set_metadata_item(&mut self, key: &str, value: &str, domain: &str) -> Result<()> {
        self.with_metadata_mut(|md| md.set_item(key, value, domain))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store() {
        let mut md = MetadataStore::default();
        md.set_item("INTERLEAVE", "BAND", "IMAGE_STRUCTURE").unwrap();
        md.set_item("AREA_OR_POINT", "Area", "").unwrap();
        md.set_item("interleave", "PIXEL", "image_structure").unwrap();
        assert_eq!(md.item("INTERLEAVE", "IMAGE_STRUCTURE"), Some("PIXEL"));
        assert_eq!(md.item("AREA_OR_POINT", "IMAGE_STRUCTURE"), None);
        assert_eq!(md.domains(), vec!["IMAGE_STRUCTURE", ""]);
        assert!(md.set_item("BAD KEY", "x", "").is_err());
        assert_eq!(md.domain("").unwrap().len(), 1);
    }
}
