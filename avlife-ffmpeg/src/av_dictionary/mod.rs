use crate::native::{Native, AV_DICT_IGNORE_SUFFIX};
use crate::util::error_handler::{lossy_string, AVError};
use anyhow::Result;
use avlife_proc_macro::wrap_ffmpeg;
use std::collections::HashMap;
use std::ffi::CString;
use std::ptr::null_mut;

/// Key/value configuration handed to a single open call.
pub type Options = HashMap<String, String>;

wrap_ffmpeg!(
    AVDictionary<Dictionary> drop+ [av_dict_free]
);

impl<N: Native> AVDictionary<N> {
    /// Copies `options` into a native dictionary.
    ///
    /// Keys go in sorted order so that leftover reports are stable. An empty
    /// map yields an empty (null) dictionary, which the native open calls
    /// accept.
    pub fn build(options: &Options) -> Result<Self> {
        let mut dictionary = AVDictionary { inner: null_mut() };

        let mut entries = options.iter().collect::<Vec<_>>();
        entries.sort();

        for (key, value) in entries {
            let key_c = CString::new(key.as_str()).map_err(|_| {
                AVError::InvalidArgument(format!("option key {:?} contains a NUL byte", key))
            })?;
            let value_c = CString::new(value.as_str()).map_err(|_| {
                AVError::InvalidArgument(format!("value of option {:?} contains a NUL byte", key))
            })?;

            native! {
                N::av_dict_set(
                    &mut dictionary.inner,
                    key_c.as_ptr(),
                    value_c.as_ptr(),
                    0
                ) or format!("Failed to set option \"{}\"", key)
            };
        }

        Ok(dictionary)
    }

    /// Slot for the native open calls, which consume recognised entries and
    /// may swap in a new dictionary holding the rest.
    pub(crate) fn as_mut_ptr(&mut self) -> *mut *mut N::Dictionary {
        &mut self.inner
    }

    /// Collects the keys nobody consumed and frees the native storage.
    pub fn drain(mut self) -> Vec<String> {
        let mut keys = vec![];
        let mut entry = null_mut::<N::DictionaryEntry>();

        loop {
            entry = unsafe {
                N::av_dict_get(self.inner, c"".as_ptr(), entry.cast_const(), AV_DICT_IGNORE_SUFFIX)
            };
            if entry.is_null() {
                break;
            }
            keys.push(unsafe { lossy_string(N::av_dict_entry_key(entry)) });
        }

        unsafe {
            N::av_dict_free(&mut self.inner);
        }

        keys
    }
}

/// Fails when any option was left unconsumed, quoting every leftover key.
pub fn ensure_consumed(unused: &[String], label: &'static str) -> Result<()> {
    if unused.is_empty() {
        return Ok(());
    }

    let keys = unused
        .iter()
        .map(|x| format!("\"{}\"", x))
        .collect::<Vec<_>>()
        .join(", ");

    Err(AVError::UnusedOptions { label, keys }.into())
}

#[cfg(test)]
fn options(pairs: &[(&str, &str)]) -> Options {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_drain_reports_every_key() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let dictionary = AVDictionary::<Fake>::build(&options(&[("b", "2"), ("a", "1")])).unwrap();
    assert_eq!(dictionary.drain(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(fake::live(Kind::Dictionary), 0);
    fake::assert_no_leaks();
}

#[test]
fn test_empty_options_allocate_nothing() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    let dictionary = AVDictionary::<Fake>::build(&Options::new()).unwrap();
    assert!(dictionary.drain().is_empty());
    assert_eq!(fake::allocations(Kind::Dictionary), 0);
}

#[test]
fn test_undrained_dictionary_is_freed_on_drop() {
    use crate::native::fake::{self, Fake, Kind};
    fake::reset();

    {
        let _dictionary = AVDictionary::<Fake>::build(&options(&[("probesize", "32")])).unwrap();
        assert_eq!(fake::live(Kind::Dictionary), 1);
    }
    fake::assert_no_leaks();
}

#[test]
fn test_nul_in_key_is_rejected() {
    use crate::native::fake::{self, Fake};
    fake::reset();

    let error = AVDictionary::<Fake>::build(&options(&[("ok", "1"), ("bad\0key", "1")])).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AVError>(),
        Some(AVError::InvalidArgument(_))
    ));
    fake::assert_no_leaks();
}

#[test]
fn test_unused_keys_are_quoted_and_joined() {
    let error = ensure_consumed(&["foo".to_string(), "bar".to_string()], "options").unwrap_err();
    assert_eq!(error.to_string(), "Unexpected options: \"foo\", \"bar\"");

    assert!(ensure_consumed(&[], "decoder options").is_ok());
}
