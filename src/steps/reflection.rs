//! Composite step chaining deep-thought generation, critique, and a final
//! critique-integrated answer, with a `STATUS` frame per sub-phase.

use crate::context::AgentContext;
use crate::error::Result;
use crate::protocol::Frame;
use crate::steps::{execute, integrate};

pub async fn reflection_loop(http: &reqwest::Client, ctx: &mut AgentContext) -> Result<()> {
    let _ = ctx.stream_sink.send(Frame::Status {
        step: "reflection_loop:execute_deep_thought",
    });
    execute::execute_deep_thought(http, ctx).await?;

    let _ = ctx.stream_sink.send(Frame::Status {
        step: "reflection_loop:execute_critics",
    });
    execute::execute_critics(http, ctx).await?;

    let _ = ctx.stream_sink.send(Frame::Status {
        step: "reflection_loop:integrate_with_critiques",
    });
    integrate::integrate_with_critiques(http, ctx).await?;

    Ok(())
}
