//! Accessors over Kubernetes workload objects.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | security_context | Container security context lookups and capability matching |
//! | workload | Pod spec extraction from admitted objects |

pub mod security_context;
pub mod workload;

pub use security_context::{
    EffectiveUser, effective_user, get_security_context, has_required_capability,
};
pub use workload::{ExtractError, extract_pod_spec, pod_spec_pointer};
