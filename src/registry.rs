//! Static `agentMode -> step list` table.
//!
//! Grounded in the teacher's static `HOOK_*` event-name table pattern
//! (`hooks.rs`), generalized from a flat constant list to a closed
//! `modeId -> [StepKind]` lookup. Unknown mode ids fall back to `standard`.

use crate::steps::StepKind;
use std::collections::HashMap;
use std::sync::LazyLock;

const STANDARD: &[StepKind] = &[StepKind::ExecuteStandard, StepKind::IntegrateStandard];
const EXPERT_TEAM: &[StepKind] = &[StepKind::ExecuteExpertTeam, StepKind::IntegrateStandard];
const DEEP_THOUGHT: &[StepKind] = &[StepKind::ExecuteDeepThought, StepKind::IntegrateDeepThought];
const CRITIQUE: &[StepKind] = &[
    StepKind::ExecuteGenerators,
    StepKind::ExecuteCritics,
    StepKind::IntegrateWithCritiques,
];
const DYNAMIC_ROUTER: &[StepKind] = &[
    StepKind::ExecuteRouter,
    StepKind::ExecuteExpertTeam,
    StepKind::IntegrateStandard,
];
const MANAGER: &[StepKind] = &[
    StepKind::PlanSubtasks,
    StepKind::ExecuteSubtasks,
    StepKind::IntegrateReport,
];
const REFLECTION_LOOP: &[StepKind] = &[StepKind::ReflectionLoop];
const HYPOTHESIS: &[StepKind] = &[
    StepKind::GenerateHypotheses,
    StepKind::ExecuteSubtasks,
    StepKind::IntegrateReport,
];
const EMOTION_ANALYSIS: &[StepKind] = &[
    StepKind::ExecuteEmotionAnalysis,
    StepKind::IntegrateWithEmotion,
];

static REGISTRY: LazyLock<HashMap<&'static str, &'static [StepKind]>> = LazyLock::new(|| {
    HashMap::from([
        ("standard", STANDARD),
        ("expert_team", EXPERT_TEAM),
        ("deep_thought", DEEP_THOUGHT),
        ("critique", CRITIQUE),
        ("dynamic_router", DYNAMIC_ROUTER),
        ("manager", MANAGER),
        ("reflection_loop", REFLECTION_LOOP),
        ("hypothesis", HYPOTHESIS),
        ("emotion_analysis", EMOTION_ANALYSIS),
    ])
});

/// Looks up the step sequence (post-summarisation) for `mode_id`. Unknown
/// ids fall back to `standard` rather than failing the request.
pub fn steps_for(mode_id: &str) -> &'static [StepKind] {
    REGISTRY.get(mode_id).copied().unwrap_or(STANDARD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mode_resolves_its_own_steps() {
        assert_eq!(steps_for("manager"), MANAGER);
        assert_eq!(steps_for("reflection_loop"), REFLECTION_LOOP);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_standard() {
        assert_eq!(steps_for("totally_unknown"), STANDARD);
    }

    #[test]
    fn test_every_enumerated_mode_is_registered() {
        for mode in [
            "standard",
            "expert_team",
            "deep_thought",
            "critique",
            "dynamic_router",
            "manager",
            "reflection_loop",
            "hypothesis",
            "emotion_analysis",
        ] {
            assert!(REGISTRY.contains_key(mode));
        }
    }
}
