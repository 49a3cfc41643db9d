use std::path::{Path, PathBuf};

use cerebral_core::{Attachment, MemoryInput, ProvenanceFilter};
use cerebral_memory::{AddOutcome, filter_by_provenance};

use super::render::{degraded_banner, print_memories, print_memory, print_stats};
use crate::context::AppContext;

pub(super) async fn cmd_load(
    ctx: &AppContext,
    branch: &str,
    provenance: ProvenanceFilter,
) -> cerebral_core::Result<()> {
    let fetched = ctx.memory.load_memories(branch).await?;
    degraded_banner(&fetched);
    let memories = filter_by_provenance(fetched.into_data(), provenance);
    println!("🧠 {branch} · {} memories", memories.len());
    print_memories(&memories);
    Ok(())
}

pub(super) async fn cmd_search(
    ctx: &AppContext,
    query: &str,
    branch: Option<&str>,
    provenance: ProvenanceFilter,
) -> cerebral_core::Result<()> {
    let fetched = ctx.memory.search_memories(query, branch).await?;
    degraded_banner(&fetched);
    let results = filter_by_provenance(fetched.into_data(), provenance);
    println!(
        "🔍 \"{query}\" in {} · {} results",
        branch.unwrap_or("all branches"),
        results.len()
    );
    for memory in &results {
        println!("  {}", memory.branch);
        print_memory(memory);
    }
    Ok(())
}

fn describe_file(path: &Path) -> cerebral_core::Result<Attachment> {
    let meta = std::fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment {
        name,
        size: meta.len(),
        mime_type: None,
    })
}

pub(super) async fn cmd_add(
    ctx: &AppContext,
    branch: &str,
    title: Option<String>,
    content: Option<String>,
    url: Option<String>,
    files: &[PathBuf],
) -> cerebral_core::Result<()> {
    let input = MemoryInput {
        title,
        content,
        url,
        files: files
            .iter()
            .map(|p| describe_file(p))
            .collect::<cerebral_core::Result<_>>()?,
    };

    match ctx.memory.add_memory(branch, &input).await? {
        AddOutcome::Created { refreshed } => {
            println!("✅ Added to {branch}");
            degraded_banner(&refreshed);
            print_memories(refreshed.data());
        }
        AddOutcome::StoredLocally(memory) => {
            println!("💾 Service unavailable. Kept locally in {branch}:");
            print_memory(&memory);
        }
    }
    Ok(())
}

pub(super) async fn cmd_remove(
    ctx: &AppContext,
    id: &str,
    branch: Option<&str>,
) -> cerebral_core::Result<()> {
    if let Some(branch) = branch {
        ctx.memory.load_memories(branch).await?;
    }
    let refreshed = ctx.memory.remove_memory(id).await?;
    println!("🗑️  Deleted {id}");
    if let Some(refreshed) = refreshed {
        degraded_banner(&refreshed);
        print_memories(refreshed.data());
    }
    Ok(())
}

pub(super) async fn cmd_stats(ctx: &AppContext, empty_on_failure: bool) -> cerebral_core::Result<()> {
    let fetched = if empty_on_failure {
        ctx.memory.get_stats_or_empty().await
    } else {
        ctx.memory.get_stats().await
    };
    degraded_banner(&fetched);
    println!("📊 Memory statistics");
    print_stats(fetched.data());
    Ok(())
}

pub(super) fn cmd_local(ctx: &AppContext, branch: &str) -> cerebral_core::Result<()> {
    let memories = ctx.memory.local_memories(branch)?;
    println!("💾 {branch} · {} kept locally", memories.len());
    print_memories(&memories);
    Ok(())
}
