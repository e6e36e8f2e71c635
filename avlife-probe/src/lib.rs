//! Command line surface of `avlife-probe`, kept outside the binary so it
//! builds and tests without the native libraries.

pub mod args;
