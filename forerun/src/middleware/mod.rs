mod tracing;

pub use self::tracing::{Tracing, TracingHandler};
use crate::handler::Handler;

pub trait Middleware<H: Handler> {
    type Output: Handler;

    fn transform(self, input: H) -> Self::Output;
}
