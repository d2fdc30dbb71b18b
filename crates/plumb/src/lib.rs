//! Startup schema verification.
//!
//! Compares the models an application declares with the tables that actually
//! exist in its database, and reports every divergence before the application
//! starts trusting the schema.
//!
//! # Declaring models
//!
//! Models are registered statically, next to the code that uses them:
//!
//! ```ignore
//! use plumb::{AttrType, ModelAttribute, ModelDef, RawModel};
//!
//! fn customer() -> RawModel {
//!     RawModel::new("customers")
//!         .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
//!         .attribute(ModelAttribute::new("email", AttrType::VarChar(255)).not_null().unique())
//! }
//!
//! plumb::inventory::submit!(ModelDef::new(customer));
//! ```
//!
//! # Verifying at startup
//!
//! ```ignore
//! let verifier = Verifier::with_policy(DelayThenExit::from_config(&config));
//! let options = VerifyOptions::from_config(&config).order_states(lifecycle());
//! let ok = verifier
//!     .run_once(&PgIntrospector::new(&client), &Registered, &options)
//!     .await;
//! ```
//!
//! Only the first `run_once` touches the database. Later calls, including
//! concurrent ones, get the cached verdict.
//!
//! # Dialects
//!
//! Declared types map to DDL per dialect. Postgres has no mapping for most
//! types; a model using one fails with `UnsupportedType` rather than being
//! silently accepted. MySQL foreign keys are not verified.

pub mod check;
mod error;
mod introspect;
pub mod mapper;
mod postgres;
mod report;
mod verifier;
mod verify;
mod violation;

pub use error::Error;
pub use introspect::{Introspector, ModelRegistry, Registered};
pub use mapper::{UnsupportedType, map_type};
pub use postgres::PgIntrospector;
pub use report::{Check, Diagnostic, Finding, Severity, TableOutcome, VerificationReport};
pub use verifier::{DelayThenExit, FailurePolicy, LogOnly, Verifier};
pub use verify::{Exclude, VerifyOptions, dialect_from_config, load_config, verify};
pub use violation::{Violation, ViolationKind};

pub use plumb_config::{Config, ConfigError};
pub use plumb_schema::{
    AttrType, Dialect, IntrospectedColumn, IntrospectedForeignKey, IntrospectedIndex,
    ModelAttribute, ModelDef, ModelIndex, OrderState, RawModel, Reference, TableDescription,
    collect_models, inventory,
};

pub type Result<T> = std::result::Result<T, Error>;
