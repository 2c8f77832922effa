//! Observation defaulting applied before projection

use super::result::PVPResult;

/// Fill absent fields from their fallbacks
///
/// Title and description default to the check id, a subject's
/// `evaluated_on` to its observation's `collected` time. Fields that are
/// already set are never touched, so applying this twice is the same as
/// applying it once.
pub fn apply_defaults(mut pvp_result: PVPResult) -> PVPResult {
    for observation in &mut pvp_result.observations_by_check {
        if observation.title.is_none() {
            observation.title = Some(observation.check_id.clone());
        }
        if observation.description.is_none() {
            observation.description = Some(observation.check_id.clone());
        }
        for subject in &mut observation.subjects {
            if subject.evaluated_on.is_none() {
                subject.evaluated_on = Some(observation.collected);
            }
        }
    }
    pvp_result
}
