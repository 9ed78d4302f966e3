//! Random stream collaborator
//!
//! - **UniformSequence**: validated, immutable draws in [0, 1), loaded or generated
//! - **SequenceCursor**: wrapping, resettable position over a sequence
//! - **UniformStream**: the interface the simulation core draws through
//!
//! Acceptance testing of the sequence (mean, variance, chi-square, runs) is
//! done upstream; this module only checks that every value lies in [0, 1).

pub mod sequence;
pub mod stream;

pub use sequence::*;
pub use stream::*;
