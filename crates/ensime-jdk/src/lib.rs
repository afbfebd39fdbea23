//! JDK discovery and JVM flag handling.
//!
//! The generated `.ensime` file records the JDK the server should run on
//! ([`JavaHome`]) and the JVM flags it should start with ([`java_flags`]).

mod discovery;
mod flags;

pub use discovery::{DiscoveryEnv, JavaHome, JdkDiscoveryError};
pub use flags::{java_flags, split_flags, DEFAULT_STACK_SIZE_FLAG};
