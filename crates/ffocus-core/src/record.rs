#![forbid(unsafe_code)]

//! Record identity.

use std::fmt::Debug;

/// A row in a reconciled collection.
///
/// The only thing the engine needs from a record is a stable identifier.
/// If the remote store reassigns ids across refetches, resolution cannot
/// succeed and requests will expire.
pub trait Record {
    /// Opaque identifier, compared by equality only.
    type Id: Clone + Eq + Debug;

    /// The record's identifier.
    fn id(&self) -> &Self::Id;
}

impl<R: Record + ?Sized> Record for Box<R> {
    type Id = R::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }
}

impl<R: Record + ?Sized> Record for std::rc::Rc<R> {
    type Id = R::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }
}

impl<R: Record + ?Sized> Record for std::sync::Arc<R> {
    type Id = R::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }
}
