//! OpenAPI from classes - OpenAPI documents from the type graph of compiled classes.
//!
//! This library inspects compiled class metadata, starting from the classes
//! carrying a configured endpoint annotation, and produces an OpenAPI 3.0
//! document describing their full transitively reachable public surface.
//!
//! Classes come from two backends behind one model layer: class metadata
//! descriptors scanned from disk, and classes registered at runtime with
//! reflective type information.
//!
//! # Architecture
//!
//! 1. [`scanner`] and [`parser`] - Find and read class metadata descriptors
//! 2. [`runtime`] - Registry of runtime classes, pre-filled with the standard library
//! 3. [`classpath`] - Unified class lookup over both backends
//! 4. [`model`] - Identity-pooled models of classes, members and signatures
//! 5. [`detector`] and [`collector`] - Endpoints and their dependency closure
//! 6. [`walker`], [`node`] and [`plugin`] - Plugin-driven traversal of the node graph
//! 7. [`type_resolver`] - Generic type variable substitution along the node path
//! 8. [`schema_generator`] and [`openapi_builder`] - Schemas and the document
//! 9. [`serializer`] - YAML and JSON output
//! 10. [`engine`] - One run, from configuration to document
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_classes::{
//!     config::ParserConfig,
//!     engine::Engine,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let mut config = ParserConfig::new("com.example.Endpoint", "com.example.EndpointExposed");
//! config.class_path.push(PathBuf::from("./classes"));
//!
//! let engine = Engine::from_config(config).unwrap();
//! let document = engine.generate().unwrap();
//!
//! let yaml = serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod classpath;
pub mod cli;
pub mod collector;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod model;
pub mod node;
pub mod openapi_builder;
pub mod parser;
pub mod plugin;
pub mod runtime;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod signature;
pub mod type_resolver;
pub mod walker;
