//! Configuration Functions
//!
//! The crate can be configured at runtime using the functions in this module.
//! Options have a process-wide value and may be overridden per thread;
//! thread-local values take precedence when reading. Keys are case-insensitive.
//!
//! ```
//! use memraster::config::*;
//!
//! // Refuse any single pixel allocation above 64Mb
//! set_config_option("MEM_MAX_ALLOCATION", "67108864").unwrap();
//!
//! // Get the allocation limit
//! assert_eq!(get_config_option("MEM_MAX_ALLOCATION", "").unwrap(), "67108864");
//!
//! // Remove the limit again
//! clear_config_option("MEM_MAX_ALLOCATION").unwrap();
//!
//! // Check the option has been cleared
//! assert_eq!(get_config_option("MEM_MAX_ALLOCATION", "XXX").unwrap(), "XXX");
//! ```
//!
//! Recognized options:
//!
//! * `MEM_MAX_ALLOCATION`: maximum size in bytes of a single band, mask or
//!   interleaved pixel buffer. Larger allocations fail with
//!   [`RasterError::AllocationFailure`](crate::errors::RasterError::AllocationFailure).

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::errors::{RasterError, Result};

static GLOBAL_OPTIONS: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(Default::default);

thread_local! {
    static THREAD_OPTIONS: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

fn normalize_key(key: &str) -> Result<String> {
    if key.is_empty() || key.contains(['=', '\0']) {
        return Err(RasterError::BadArgument(format!(
            "Invalid config option key: '{}'",
            key.escape_debug()
        )));
    }
    Ok(key.to_ascii_uppercase())
}

fn check_value(value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(RasterError::BadArgument(format!(
            "Invalid config option value: '{}'",
            value.escape_debug()
        )));
    }
    Ok(())
}

fn with_global<R>(f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
    let mut options = match GLOBAL_OPTIONS.lock() {
        Ok(guard) => guard,
        // the map is only ever mutated by single inserts and removes, so it is valid nevertheless
        Err(poison_error) => poison_error.into_inner(),
    };
    f(&mut options)
}

/// Set a configuration option
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key)?;
    check_value(value)?;
    log::debug!("setting config option {key}={value}");
    with_global(|options| options.insert(key, value.to_string()));
    Ok(())
}

/// Get the value of a configuration option
///
/// A thread-local value overrides the process-wide one. If the config option
/// specified by `key` is not found, the value passed in the `default` parameter is returned.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    let key = normalize_key(key)?;
    if let Some(value) = THREAD_OPTIONS.with(|options| options.borrow().get(&key).cloned()) {
        return Ok(value);
    }
    Ok(with_global(|options| options.get(&key).cloned()).unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    let key = normalize_key(key)?;
    with_global(|options| options.remove(&key));
    Ok(())
}

/// Set a configuration option
/// with **thread local** scope
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key)?;
    check_value(value)?;
    THREAD_OPTIONS.with(|options| options.borrow_mut().insert(key, value.to_string()));
    Ok(())
}

/// Get the value of a configuration option
/// with **thread local** scope
///
/// If the config option specified by `key` is not found, the value passed in the `default` parameter is returned.
pub fn get_thread_local_config_option(key: &str, default: &str) -> Result<String> {
    let key = normalize_key(key)?;
    Ok(THREAD_OPTIONS
        .with(|options| options.borrow().get(&key).cloned())
        .unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a configuration option
/// with **thread local** scope
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    let key = normalize_key(key)?;
    THREAD_OPTIONS.with(|options| options.borrow_mut().remove(&key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_options() {
        // We cannot test different global config scenarios in parallel since we modify a global config state.
        // Therefore, we test the config option behavior sequentially to avoid data races.

        test_set_get_option();

        test_set_option_with_embedded_nul();

        test_clear_option();

        test_set_get_option_thread_local();

        test_set_option_with_embedded_nul_thread_local();

        test_clear_option_thread_local();
    }

    fn test_set_get_option() {
        assert!(set_config_option("TEST_CACHEMAX", "128").is_ok());
        assert_eq!(
            get_config_option("TEST_CACHEMAX", "").unwrap_or_else(|_| "".to_string()),
            "128"
        );
        assert_eq!(
            get_config_option("test_cachemax", "").unwrap_or_else(|_| "".to_string()),
            "128"
        );
        assert_eq!(
            get_config_option("NON_EXISTANT_OPTION", "DEFAULT_VALUE")
                .unwrap_or_else(|_| "".to_string()),
            "DEFAULT_VALUE"
        );
    }

    fn test_set_option_with_embedded_nul() {
        assert!(set_config_option("f\0oo", "valid").is_err());
        assert!(set_config_option("foo", "in\0valid").is_err());
        assert!(set_config_option("xxxf\0oo", "in\0valid").is_err());
        assert!(set_config_option("", "valid").is_err());
        assert!(set_config_option("A=B", "valid").is_err());
    }

    fn test_clear_option() {
        assert!(set_config_option("TEST_OPTION", "256").is_ok());
        assert_eq!(
            get_config_option("TEST_OPTION", "DEFAULT").unwrap_or_else(|_| "".to_string()),
            "256"
        );
        assert!(clear_config_option("TEST_OPTION").is_ok());
        assert_eq!(
            get_config_option("TEST_OPTION", "DEFAULT").unwrap_or_else(|_| "".to_string()),
            "DEFAULT"
        );
    }

    fn test_set_get_option_thread_local() {
        assert!(set_thread_local_config_option("TEST_CACHEMAX", "256").is_ok());

        assert_eq!(
            get_thread_local_config_option("TEST_CACHEMAX", "").unwrap_or_else(|_| "".to_string()),
            "256"
        );
        // test override for global getter
        assert_eq!(
            get_config_option("TEST_CACHEMAX", "").unwrap_or_else(|_| "".to_string()),
            "256"
        );

        assert_eq!(
            get_thread_local_config_option("NON_EXISTANT_OPTION", "DEFAULT_VALUE")
                .unwrap_or_else(|_| "".to_string()),
            "DEFAULT_VALUE"
        );

        // other threads only see the global value
        let other = std::thread::spawn(|| get_config_option("TEST_CACHEMAX", "").unwrap())
            .join()
            .unwrap();
        assert_eq!(other, "128");

        assert!(clear_thread_local_config_option("TEST_CACHEMAX").is_ok());
        assert!(clear_config_option("TEST_CACHEMAX").is_ok());
    }

    fn test_set_option_with_embedded_nul_thread_local() {
        assert!(set_thread_local_config_option("f\0oo", "valid").is_err());
        assert!(set_thread_local_config_option("foo", "in\0valid").is_err());
        assert!(set_thread_local_config_option("xxxf\0oo", "in\0valid").is_err());
    }

    fn test_clear_option_thread_local() {
        assert!(set_thread_local_config_option("TEST_OPTION", "256").is_ok());

        assert_eq!(
            get_thread_local_config_option("TEST_OPTION", "DEFAULT")
                .unwrap_or_else(|_| "".to_string()),
            "256"
        );
        // test override for global getter
        assert_eq!(
            get_config_option("TEST_OPTION", "DEFAULT").unwrap_or_else(|_| "".to_string()),
            "256"
        );

        assert!(clear_thread_local_config_option("TEST_OPTION").is_ok());

        assert_eq!(
            get_thread_local_config_option("TEST_OPTION", "DEFAULT")
                .unwrap_or_else(|_| "".to_string()),
            "DEFAULT"
        );
        // test override for global getter
        assert_eq!(
            get_config_option("TEST_OPTION", "DEFAULT").unwrap_or_else(|_| "".to_string()),
            "DEFAULT"
        );
    }
}
