use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Holds a sensitive value (API tokens, shared secrets) so that it can never end up in a log line by accident.
/// The only way to get at the value is to call [`Secret::reveal`].
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
