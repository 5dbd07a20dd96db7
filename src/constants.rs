//! # Constants
//!
//! Default values, label keys and annotation keys shared across the engine.

/// Default field manager used for create/update calls
pub const DEFAULT_FIELD_MANAGER: &str = "tempo-operator";

/// Default minimum backoff after a failed reconciliation (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default maximum backoff after a failed reconciliation (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default requeue interval after a clean reconciliation (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Label carrying the component a workload belongs to
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";

/// Label carrying the owning instance name
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";

/// Label carrying the managing operator
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label carrying the application name
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Value of [`LABEL_MANAGED_BY`] on every operator-created object
pub const MANAGED_BY_VALUE: &str = "tempo-operator";

/// Value of [`LABEL_NAME`] on objects created for a `TempoStack`
pub const STACK_APP_NAME: &str = "tempo";

/// Value of [`LABEL_NAME`] on objects created for a `TempoMonolithic`
pub const MONOLITHIC_APP_NAME: &str = "tempo-monolithic";

/// OpenShift service-ca annotation; the service-ca controller owns the data of
/// ConfigMaps carrying it
pub const INJECT_CABUNDLE_ANNOTATION: &str = "service.beta.openshift.io/inject-cabundle";
