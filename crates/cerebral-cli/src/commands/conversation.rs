use crate::context::AppContext;

pub(super) async fn cmd_agents(ctx: &AppContext) -> cerebral_core::Result<()> {
    let agents = ctx.directory.list_agents().await;
    if agents.is_empty() {
        println!("No agents registered (or the conversation service is unavailable).");
        return Ok(());
    }
    for agent in &agents {
        let status = agent.status.as_deref().unwrap_or("unknown");
        println!("  🤖 {} ({}) [{status}]", agent.agent_name, agent.agent_id);
        if !agent.description.is_empty() {
            println!("     {}", agent.description);
        }
        let skills = agent.skill_names();
        if !skills.is_empty() {
            println!("     skills: {}", skills.join(", "));
        }
    }
    Ok(())
}

pub(super) async fn cmd_flows(ctx: &AppContext) -> cerebral_core::Result<()> {
    let flows = ctx.directory.list_flows().await;
    if flows.is_empty() {
        println!("No flows available (or the conversation service is unavailable).");
        return Ok(());
    }
    for flow in &flows {
        println!(
            "  🔀 {} ({}) · {} · {} steps",
            flow.flow_name,
            flow.flow_id,
            flow.flow_type.as_deref().unwrap_or("-"),
            flow.step_count
        );
        if !flow.description.is_empty() {
            println!("     {}", flow.description);
        }
    }
    Ok(())
}

pub(super) async fn cmd_health(ctx: &AppContext) -> cerebral_core::Result<()> {
    let stats = ctx.directory.health().await?;
    println!("🩺 Conversation service");
    println!("   sessions: {} ({} active)", stats.total_sessions, stats.active_sessions);
    println!("   agents:   {}", stats.registered_agents);
    println!("   flows:    {}", stats.registered_flows);
    if !stats.flow_types.is_empty() {
        println!("   flow types: {}", stats.flow_types.join(", "));
    }
    Ok(())
}
