//! The step library: each step is `async fn(&reqwest::Client, &mut AgentContext) -> Result<()>`.
//! `StepKind` names each one for the `AgentRegistry` and for the `STATUS`
//! frame the orchestrator emits before running it.

mod execute;
mod integrate;
mod planning;
mod reflection;

use crate::context::AgentContext;
use crate::error::Result;

/// Enumerates every step the registry can schedule. Closed set: adding a new
/// step means adding a variant here and a branch in `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    PlanSubtasks,
    GenerateHypotheses,
    ExecuteStandard,
    ExecuteExpertTeam,
    ExecuteDeepThought,
    ExecuteGenerators,
    ExecuteCritics,
    ExecuteRouter,
    ExecuteSubtasks,
    ExecuteEmotionAnalysis,
    IntegrateStandard,
    IntegrateDeepThought,
    IntegrateWithCritiques,
    IntegrateReport,
    IntegrateWithEmotion,
    ReflectionLoop,
}

impl StepKind {
    /// Name used in `STATUS:STEP:<name>` frames.
    pub fn name(self) -> &'static str {
        match self {
            StepKind::PlanSubtasks => "plan_subtasks",
            StepKind::GenerateHypotheses => "generate_hypotheses",
            StepKind::ExecuteStandard => "execute_standard",
            StepKind::ExecuteExpertTeam => "execute_expert_team",
            StepKind::ExecuteDeepThought => "execute_deep_thought",
            StepKind::ExecuteGenerators => "execute_generators",
            StepKind::ExecuteCritics => "execute_critics",
            StepKind::ExecuteRouter => "execute_router",
            StepKind::ExecuteSubtasks => "execute_subtasks",
            StepKind::ExecuteEmotionAnalysis => "execute_emotion_analysis",
            StepKind::IntegrateStandard => "integrate_standard",
            StepKind::IntegrateDeepThought => "integrate_deep_thought",
            StepKind::IntegrateWithCritiques => "integrate_with_critiques",
            StepKind::IntegrateReport => "integrate_report",
            StepKind::IntegrateWithEmotion => "integrate_with_emotion",
            StepKind::ReflectionLoop => "reflection_loop",
        }
    }

    pub async fn run(self, http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
        match self {
            StepKind::PlanSubtasks => planning::plan_subtasks(http, ctx).await,
            StepKind::GenerateHypotheses => planning::generate_hypotheses(http, ctx).await,
            StepKind::ExecuteStandard => execute::execute_standard(http, ctx).await,
            StepKind::ExecuteExpertTeam => execute::execute_expert_team(http, ctx).await,
            StepKind::ExecuteDeepThought => execute::execute_deep_thought(http, ctx).await,
            StepKind::ExecuteGenerators => execute::execute_generators(http, ctx).await,
            StepKind::ExecuteCritics => execute::execute_critics(http, ctx).await,
            StepKind::ExecuteRouter => execute::execute_router(http, ctx).await,
            StepKind::ExecuteSubtasks => execute::execute_subtasks(http, ctx).await,
            StepKind::ExecuteEmotionAnalysis => execute::execute_emotion_analysis(http, ctx).await,
            StepKind::IntegrateStandard => integrate::integrate_standard(http, ctx).await,
            StepKind::IntegrateDeepThought => integrate::integrate_deep_thought(http, ctx).await,
            StepKind::IntegrateWithCritiques => integrate::integrate_with_critiques(http, ctx).await,
            StepKind::IntegrateReport => integrate::integrate_report(http, ctx).await,
            StepKind::IntegrateWithEmotion => integrate::integrate_with_emotion(http, ctx).await,
            StepKind::ReflectionLoop => reflection::reflection_loop(http, ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names_match_spec_identifiers() {
        assert_eq!(StepKind::PlanSubtasks.name(), "plan_subtasks");
        assert_eq!(StepKind::IntegrateWithEmotion.name(), "integrate_with_emotion");
        assert_eq!(StepKind::ReflectionLoop.name(), "reflection_loop");
    }
}
