//! goas - OpenAPI 3 documents from annotated Go source code.
//!
//! The library reads a Go module without invoking the Go toolchain: it parses
//! `go.mod`, finds package directories in the module, the module download
//! cache and the standard library, and parses type declarations on demand.
//! Comment directives on functions describe operations; the Go types they
//! reference become schemas in `components.schemas`.
//!
//! # Architecture
//!
//! 1. [`config`] - Validated inputs of one run
//! 2. [`gomod`] / [`scanner`] / [`locator`] - Package discovery
//! 3. [`syntax`] / [`parser`] / [`indexer`] - Go declaration parsing and per-package caches
//! 4. [`type_resolver`] - Type reference normalization and declaration lookup
//! 5. [`schema_generator`] - Recursive schema synthesis with an identity cache
//! 6. [`annotation`] - Comment directive and struct tag grammars
//! 7. [`openapi_builder`] - Document model, validation and assembly
//! 8. [`generator`] - Orchestration of a whole run
//! 9. [`serializer`] - JSON and YAML output
//!
//! # Example Usage
//!
//! ```no_run
//! use goas::config::GeneratorConfig;
//! use goas::generator::generate;
//! use goas::serializer::serialize_json;
//!
//! let config = GeneratorConfig::new("./my-service").with_strict(true);
//! let document = generate(&config).unwrap();
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotation;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod gomod;
pub mod indexer;
pub mod locator;
pub mod openapi_builder;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod syntax;
pub mod type_resolver;
