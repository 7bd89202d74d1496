//! Loader and validator for Swagger 2.0 (`OpenAPI` v2) documents.
//!
//! Takes a raw, already-parsed tree (`serde_json::Value`, typically
//! produced by `serde_json` or `serde_yaml`) and assembles it into the
//! typed model of the `swagger-model` crate, enforcing the
//! specification's invariants along the way. Decoding accumulates every
//! independent problem into one [`ErrorReport`] instead of stopping at
//! the first; only a malformed root aborts early.
//!
//! ```
//! let raw: serde_json::Value = serde_yaml::from_str(
//!     r#"
//!     swagger: "2.0"
//!     info: { title: Petstore, version: "1.0.0" }
//!     paths: {}
//!     "#,
//! )
//! .unwrap();
//!
//! let assembly = swagger_loader::assemble(&raw).unwrap();
//! assert_eq!(assembly.document.info.title, "Petstore");
//! ```

// crate-specific lint exceptions:
//#![allow()]

pub(crate) mod assemble;
pub(crate) mod constraints;
pub(crate) mod decode;
pub(crate) mod errors;
pub(crate) mod pointer;
pub(crate) mod resolver;

pub use assemble::{assemble, Assembly};
pub use constraints::{check, conforms_to};
pub use errors::{Error, ErrorKind, ErrorReport, Result, ValidationError, Warning};
pub use pointer::Pointer;
pub use resolver::{resolve, DocumentExt, RefTarget, Resolved};

pub use swagger_model as model;
