use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

/// Slot index of a handle, and the number of times that slot was recycled.
pub type HandleIndex = u32;

/// An untyped `(index, version)` pair. A slot gets a new version every time
/// it is freed, so a handle to a deleted object never aliases its successor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    index: HandleIndex,
    version: HandleIndex,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle ({}, {})", self.index, self.version)
    }
}

/// Anything the pools can hand out.
pub trait HandleLike: Debug + Copy + Hash + Eq + Ord {
    fn new(index: HandleIndex, version: HandleIndex) -> Self;
    fn index(&self) -> HandleIndex;
    fn version(&self) -> HandleIndex;
}

impl HandleLike for Handle {
    #[inline]
    fn new(index: HandleIndex, version: HandleIndex) -> Self {
        Handle { index, version }
    }

    #[inline]
    fn index(&self) -> HandleIndex {
        self.index
    }

    #[inline]
    fn version(&self) -> HandleIndex {
        self.version
    }
}

/// Declares a handle type for one kind of context object. It prints as
/// `TextureHandle (3, 1)` in logs and error messages.
#[macro_export]
macro_rules! impl_handle {
    ($name:ident) => {
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::utils::handle::Handle);

        impl $crate::utils::handle::HandleLike for $name {
            #[inline]
            fn new(
                index: $crate::utils::handle::HandleIndex,
                version: $crate::utils::handle::HandleIndex,
            ) -> Self {
                $name($crate::utils::handle::HandleLike::new(index, version))
            }

            #[inline]
            fn index(&self) -> $crate::utils::handle::HandleIndex {
                $crate::utils::handle::HandleLike::index(&self.0)
            }

            #[inline]
            fn version(&self) -> $crate::utils::handle::HandleIndex {
                $crate::utils::handle::HandleLike::version(&self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                use $crate::utils::handle::HandleLike;
                write!(f, "{} ({}, {})", stringify!($name), self.index(), self.version())
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    impl_handle!(SlotHandle);

    #[test]
    fn versions_distinguish_slots() {
        let a = Handle::new(1, 1);
        let b = Handle::new(1, 2);

        let mut set = HashSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(Handle::new(1, 1)));
        assert!(set.insert(b));
        assert!(a < b);
    }

    #[test]
    fn typed() {
        let h = SlotHandle::new(3, 1);
        assert_eq!(h.index(), 3);
        assert_eq!(h.version(), 1);
        assert_eq!(SlotHandle::default().index(), 0);
        assert_eq!(format!("{}", h), "SlotHandle (3, 1)");
    }
}
