use std::sync::Arc;

use crate::handler::Handler;

/// Values that can be appended to or prepended onto a
/// [`Group`](super::Group).
///
/// Handlers of different types are passed together as a tuple, a single
/// handler as a one-element tuple: `group.append((request_id,))`.
pub trait IntoUnits {
    fn into_units(self) -> Vec<Arc<dyn Handler>>;
}

impl IntoUnits for () {
    fn into_units(self) -> Vec<Arc<dyn Handler>> {
        Vec::new()
    }
}

impl IntoUnits for Arc<dyn Handler> {
    fn into_units(self) -> Vec<Arc<dyn Handler>> {
        vec![self]
    }
}

impl IntoUnits for Vec<Arc<dyn Handler>> {
    fn into_units(self) -> Vec<Arc<dyn Handler>> {
        self
    }
}

macro_rules! impl_into_units_for_tuple {
    ($($ty:ident),+ $(,)?) => {
        impl<$($ty,)+> IntoUnits for ($($ty,)+)
        where
            $($ty: Handler,)+
        {
            #[allow(non_snake_case)]
            fn into_units(self) -> Vec<Arc<dyn Handler>> {
                let ($($ty,)+) = self;

                vec![$(Arc::new($ty) as Arc<dyn Handler>,)+]
            }
        }
    };
}

impl_into_units_for_tuple!(T1);
impl_into_units_for_tuple!(T1, T2);
impl_into_units_for_tuple!(T1, T2, T3);
impl_into_units_for_tuple!(T1, T2, T3, T4);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_into_units_for_tuple!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    #[test]
    fn test_into_units_len() {
        let noop = || handler_fn(|_, _| {});

        assert!(().into_units().is_empty());
        assert_eq!((noop(),).into_units().len(), 1);
        assert_eq!((noop(), noop(), noop()).into_units().len(), 3);

        let shared: Arc<dyn Handler> = Arc::new(noop());
        assert_eq!(shared.clone().into_units().len(), 1);
        assert_eq!(vec![shared.clone(), shared].into_units().len(), 2);
    }
}
