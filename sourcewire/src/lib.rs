//! Generation driver based on [sourcewire_di] static dependency wiring.
//!
//! The engine itself is a pure function from declarations to generated sources. This crate
//! provides everything around it: configuration loading, logging, reading declarations of the
//! analysed program and writing generated sources out. The entrypoint is the
//! [Application](application::Application), which is assembled from three pluggable
//! collaborators:
//!
//! * [GeneratorConfigProvider](config::GeneratorConfigProvider) - generator configuration
//! * [DeclarationSource](source::DeclarationSource) - declarations to analyse
//! * [SourceSink](sink::SourceSink) - destination of generated sources

pub mod application;
pub mod config;
pub mod sink;
pub mod source;
