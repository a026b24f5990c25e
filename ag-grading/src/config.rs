/// Resolves Open Question 2 (spec.md §9: "On a duplicated submission id...
/// the worker's behavior differs by version between rejecting and
/// overwriting the scratch directory. Implementers should make this
/// configurable."). Default is `Reject`; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchCollisionPolicy {
    Reject,
    Overwrite,
}

impl ScratchCollisionPolicy {
    pub fn from_env() -> Self {
        match std::env::var("AUTOGRADER_SCRATCH_COLLISION").as_deref() {
            Ok("overwrite") | Ok("Overwrite") => ScratchCollisionPolicy::Overwrite,
            _ => ScratchCollisionPolicy::Reject,
        }
    }
}

/// Builder-configurable knobs for a `GradingJob`, mirroring
/// `MarkingJob::new().with_coverage(..).with_feedback(..)`'s builder shape.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Remove the per-submission scratch directory on completion (spec.md
    /// §3 Submission lifecycle: "scratch directory deleted (unless
    /// disable-cleanup is set)").
    pub cleanup: bool,
    /// Include the raw sandboxed-run log inside rendered inline-test HTML
    /// fragments (spec.md §4.5e).
    pub include_logs: bool,
    pub on_scratch_collision: ScratchCollisionPolicy,
    /// If true and the scratch directory already exists, wipe it first
    /// regardless of `on_scratch_collision` (spec.md §4.5 step 3:
    /// "Pre-existing directory is a hard error unless auto-remove is
    /// enabled, in which case the directory is wiped first").
    pub auto_remove_existing_scratch: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        GradingConfig {
            cleanup: true,
            include_logs: false,
            on_scratch_collision: ScratchCollisionPolicy::Reject,
            auto_remove_existing_scratch: false,
        }
    }
}
