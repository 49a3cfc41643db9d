use std::io::Write;

use console::style;
use tokio::io::AsyncBufReadExt;
use tracing::debug;

use cerebral_conversation::{SessionMachine, TurnEvent};
use cerebral_core::CerebralError;

use crate::context::AppContext;

fn print_event(event: &TurnEvent) {
    match event {
        TurnEvent::Reply(text) => {
            eprint!("{} ", style("cerebral>").green());
            println!("{text}");
        }
        TurnEvent::MemoryLookup { count, domain } => {
            eprintln!(
                "{}",
                style(format!(
                    "   🔎 looked up {count} memories in {}",
                    domain.as_deref().unwrap_or("all regions")
                ))
                .dim()
            );
        }
        TurnEvent::AgentReply { agent_name, text } => {
            eprint!("{} ", style(format!("{agent_name}>")).magenta());
            println!("{text}");
        }
        TurnEvent::FlowCompleted {
            flow_name,
            duration_secs,
        } => {
            eprintln!(
                "{}",
                style(format!(
                    "   ✅ flow {} completed in {duration_secs:.1}s",
                    flow_name.as_deref().unwrap_or("(unnamed)")
                ))
                .dim()
            );
        }
    }
}

fn print_state(session: &SessionMachine) {
    let s = session.session();
    println!(
        "   session: {} · state: {} · flow: {}",
        s.session_id.as_deref().unwrap_or("(none)"),
        s.state,
        s.active_flow.as_deref().unwrap_or("(none)")
    );
    if let Some(at) = s.last_server_sync_at {
        println!("   last sync: {}", at.format("%H:%M:%S"));
    }
}

pub(super) async fn cmd_chat(ctx: &AppContext) -> cerebral_core::Result<()> {
    println!("🧠 Cerebral Chat");
    println!("   Type 'exit' or Ctrl+C to quit");
    println!("   Type '/state' for session state, '/reset' to start over");
    println!();

    let session = ctx.session.clone();
    let refresher = session.spawn_refresh(ctx.refresh_interval());

    let stdin = tokio::io::stdin();
    let reader = tokio::io::BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        eprint!("{} ", style("you>").cyan());
        std::io::stderr().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed {
            "exit" | "quit" | "/exit" => {
                println!("👋 Goodbye!");
                break;
            }
            "/state" => {
                print_state(&session);
                continue;
            }
            "/reset" => {
                session.reset();
                println!("   session cleared");
                continue;
            }
            _ => {}
        }

        match session.submit_turn(trimmed).await {
            Ok(outcome) => {
                for event in &outcome.events {
                    print_event(event);
                }
                if outcome.events.is_empty() {
                    debug!(state = %outcome.state, "turn produced no output");
                }
            }
            Err(CerebralError::SessionSuperseded) => {
                eprintln!("{}", style("   (reply dropped: session was reset)").dim());
            }
            Err(CerebralError::ConversationTurnFailed(reason)) => {
                eprintln!("{} {reason}", style("❌ turn failed:").red());
            }
            Err(e) => {
                eprintln!("{} {e}", style("❌ conversation service error:").red());
            }
        }
    }

    refresher.abort();
    Ok(())
}
