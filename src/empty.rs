// SPDX-License-Identifier: MIT

/// Implemented by values that have a distinguished "empty" state which the
/// structural validators reject.
pub trait Empty {
    fn is_empty(&self) -> bool;
}

impl Empty for str {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl Empty for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl<T: Empty> Empty for Option<T> {
    fn is_empty(&self) -> bool {
        self.as_ref().map_or(true, Empty::is_empty)
    }
}
