//! # alertsync-core
//!
//! Declarative alert policy synchronization.
//!
//! A [`DesiredDocument`] describes one policy and its conditions, grouped by
//! [`ConditionKind`]. The engine compares it with what the monitoring
//! service currently holds and converges the remote state with the fewest
//! create, update and delete calls:
//!
//! ```ignore
//! use alertsync_core::{apply_desired_state, upsert_policy, DesiredDocument, ParseOptions};
//!
//! let document = DesiredDocument::parse(&source, &ParseOptions::default())?;
//! let upserted = upsert_policy(&directory, &document.policy, None).await?;
//! let report = apply_desired_state(&upserted.policy.id, &document, &adapters).await?;
//! ```
//!
//! The crate contains no transport code. Callers provide a
//! [`PolicyDirectory`] and one [`ResourceAdapter`] per kind.

pub mod document;
pub mod engine;
pub mod error;
pub mod id;
pub mod kind;
pub mod model;
pub mod policy;
pub mod reconcile;
pub mod traits;

pub use document::{DesiredDocument, ParseOptions, render_template};
pub use engine::{
    KindPlan, KindReport, SyncReport, apply_change, apply_desired_state, clear_conditions,
    fetch_conditions, plan_desired_state,
};
pub use error::{DocumentError, SyncError, SyncResult};
pub use id::{ConditionId, PolicyId, ResourceId};
pub use kind::ConditionKind;
pub use model::{
    Change, ChangeAction, Condition, IncidentPreference, POLICY_ASSOCIATION_FIELD, Policy,
    PolicyDescriptor,
};
pub use policy::{
    UpsertOutcome, UpsertedPolicy, find_policy, get_policy, lookup_policy, upsert_policy,
};
pub use reconcile::reconcile;
pub use traits::{ConditionAdapters, DynResourceAdapter, PolicyDirectory, ResourceAdapter};
