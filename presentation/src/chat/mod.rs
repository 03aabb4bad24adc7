//! Interactive chat and one-shot questions
//!
//! Both print the combined answer to stdout as it streams in.

mod oneshot;
mod repl;
mod stream;

pub use oneshot::ask;
pub use repl::ChatRepl;
pub use stream::print_streaming;
