//! Value normalization
//!
//! The backend stores strings. [`CacheValue`] converts Rust values into the
//! representation they come back as: numbers in decimal form, `true` as
//! `"1"`, `false` and `None` as the empty string.

use std::fmt;

/// A value ready to be written to the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheValue(String);

impl CacheValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheValue {
    fn from(val: String) -> Self {
        CacheValue(val)
    }
}

impl From<&str> for CacheValue {
    fn from(val: &str) -> Self {
        CacheValue(val.to_string())
    }
}

impl From<&String> for CacheValue {
    fn from(val: &String) -> Self {
        CacheValue(val.clone())
    }
}

impl From<bool> for CacheValue {
    fn from(val: bool) -> Self {
        CacheValue(if val { "1" } else { "" }.to_string())
    }
}

impl From<()> for CacheValue {
    fn from(_: ()) -> Self {
        CacheValue(String::new())
    }
}

impl<T> From<Option<T>> for CacheValue
where
    T: Into<CacheValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => CacheValue(String::new()),
        }
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CacheValue {
                fn from(val: $ty) -> Self {
                    CacheValue(val.to_string())
                }
            }
        )*
    };
}

impl_from_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
