//! Flattening of nested actor, option and shot collections.

/// Something that can be pushed, possibly as many pieces, into a `Vec<T>`.
pub trait IntoFlat<T> {
    fn flatten_into(self, out: &mut Vec<T>);
}

impl<T, U: IntoFlat<T>> IntoFlat<T> for Vec<U> {
    fn flatten_into(self, out: &mut Vec<T>) {
        for item in self {
            item.flatten_into(out);
        }
    }
}

impl<T, U: IntoFlat<T>, const N: usize> IntoFlat<T> for [U; N] {
    fn flatten_into(self, out: &mut Vec<T>) {
        for item in self {
            item.flatten_into(out);
        }
    }
}

impl<T, U: IntoFlat<T>> IntoFlat<T> for Option<U> {
    fn flatten_into(self, out: &mut Vec<T>) {
        if let Some(item) = self {
            item.flatten_into(out);
        }
    }
}

pub fn flatten<T>(items: impl IntoFlat<T>) -> Vec<T> {
    let mut out = Vec::new();
    items.flatten_into(&mut out);
    out
}
