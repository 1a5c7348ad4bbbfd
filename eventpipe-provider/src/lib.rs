// The provider module holds the descriptor type and its parser:
// "<name>[:<keywords-hex>[:<level>[:<filter data>]]]".
mod error;
mod level;
mod provider;
pub use error::*;
pub use level::*;
pub use provider::*;

// The coreclr module knows the runtime's keywords and which providers
// a profiler should turn on.
pub mod coreclr;
