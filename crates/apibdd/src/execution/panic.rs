//! Rendering of panic payloads caught around step handlers and hooks.

use std::any::Any;

/// Extract a readable message from a panic payload.
///
/// String payloads are returned as-is and common numeric payloads are
/// formatted; anything else falls back to its `Debug` rendering.
///
/// # Examples
/// ```
/// use apibdd::panic_message;
/// use std::any::Any;
///
/// let payload: Box<dyn Any + Send> = Box::new("boom");
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, isize, usize, f32, f64);
    format!("{payload:?}")
}
