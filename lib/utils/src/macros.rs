//! Macros for defining thin newtypes over integers with various behaviors.

/// Implement conversions, [core::ops::Deref] and const accessors for a
/// newtype whose only field is `inner`.
#[macro_export]
macro_rules! impl_basic {
    ($name: ident, $type: ty) => {
        impl core::convert::From<$type> for $name {
            #[inline(always)]
            fn from(value: $type) -> Self {
                $name { inner: value }
            }
        }
        impl core::convert::From<$name> for $type {
            #[inline(always)]
            fn from(value: $name) -> $type {
                value.inner
            }
        }

        impl core::ops::Deref for $name {
            type Target = $type;

            #[inline(always)]
            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl $name {
            /// Wrap a raw value.
            pub const fn from_const(value: $type) -> Self {
                $name { inner: value }
            }
            /// Unwrap into the raw value.
            pub const fn into_const(self) -> $type {
                self.inner
            }
        }
    };
}

/// Implement modular arithmetic for a point on a free-running counter.
///
/// The counter wraps at the bit width of `$type`, so:
/// - `A - A = N` is the forward distance from rhs to lhs, modulo 2^bits;
/// - `A + N = A` and `A - N = A` wrap instead of overflowing.
#[macro_export]
macro_rules! impl_wrapping_counter {
    ($name: ident, $type: ty) => {
        // A + N = A
        impl core::ops::Add<$type> for $name {
            type Output = $name;
            #[inline(always)]
            fn add(self, rhs: $type) -> Self::Output {
                $name {
                    inner: self.inner.wrapping_add(rhs),
                }
            }
        }

        /// A - A = N
        impl core::ops::Sub for $name {
            type Output = $type;
            #[inline(always)]
            fn sub(self, rhs: Self) -> Self::Output {
                self.inner.wrapping_sub(rhs.inner)
            }
        }

        /// A - N = A
        impl core::ops::Sub<$type> for $name {
            type Output = $name;
            #[inline(always)]
            fn sub(self, rhs: $type) -> Self::Output {
                $name {
                    inner: self.inner.wrapping_sub(rhs),
                }
            }
        }
    };
}

/// Defines a newtype with [core::ops::Deref] and conversion helpers.
/// Supports variants: wrapping, copy, or default.
#[macro_export]
macro_rules! define_struct {
    (wrapping, $(#[$meta: meta])* $name: ident, $type: ty) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name {
            inner: $type,
        }

        $crate::impl_basic!($name, $type);
        $crate::impl_wrapping_counter!($name, $type);
    };

    (copy, $(#[$meta: meta])* $name: ident, $type: ty) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name {
            inner: $type,
        }

        $crate::impl_basic!($name, $type);
    };

    ($(#[$meta: meta])* $name: ident, $type: ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        #[repr(transparent)]
        pub struct $name {
            inner: $type,
        }

        $crate::impl_basic!($name, $type);
    };
}
