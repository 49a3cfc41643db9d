use console::style;

use cerebral_core::{Fetched, Memory, MemoryStats, Provenance};

/// Truncate a string to `max` characters, appending "..." if truncated.
pub(super) fn truncate_output(s: &str, max: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let head: String = flat.chars().take(max).collect();
        format!("{head}...")
    }
}

pub(super) fn provenance_label(provenance: Provenance) -> &'static str {
    match provenance {
        Provenance::System => "system",
        Provenance::User => "user",
    }
}

/// Visible marker for data that did not come from the service.
pub(super) fn degraded_banner<T>(fetched: &Fetched<T>) {
    if let Some(reason) = fetched.degraded_reason() {
        eprintln!(
            "{} {}",
            style("⚠️  degraded:").yellow().bold(),
            style(format!("service unavailable ({reason}), showing sample data")).yellow()
        );
    }
}

pub(super) fn print_memory(memory: &Memory) {
    let tags: Vec<&str> = memory.tags.iter().map(String::as_str).collect();
    println!(
        "  {} {} {} {}",
        style(&memory.id).dim(),
        style(format!("[{}]", provenance_label(memory.provenance))).cyan(),
        memory.timestamp.format("%Y-%m-%d %H:%M"),
        style(format!("★{:.2} ×{}", memory.importance, memory.access_count)).dim(),
    );
    println!("     {}", truncate_output(&memory.content, 120));
    if let Some(url) = memory.url() {
        println!("     🔗 {url}");
    }
    if !tags.is_empty() {
        println!("     {}", style(format!("#{}", tags.join(" #"))).dim());
    }
}

pub(super) fn print_memories(memories: &[Memory]) {
    if memories.is_empty() {
        println!("  (no memories)");
        return;
    }
    for memory in memories {
        print_memory(memory);
    }
}

pub(super) fn print_stats(stats: &MemoryStats) {
    println!(
        "  {:<10} {:>7} {:>7} {:>7} {:>7} {:>6}",
        "branch", "total", "recent", "system", "user", "imp"
    );
    for (name, branch) in &stats.branches {
        println!(
            "  {:<10} {:>7} {:>7} {:>7} {:>7} {:>6.2}",
            name,
            branch.total_memories,
            branch.recent_activity,
            branch.system_generated,
            branch.user_generated,
            branch.avg_importance
        );
    }
    println!();
    println!(
        "  total {} · as of {}{}",
        stats.total_memories,
        stats.timestamp.format("%Y-%m-%d %H:%M:%S"),
        if stats.fallback_mode { " · fallback" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_output("short", 10), "short");
        assert_eq!(truncate_output("line one\nline two", 8), "line one...");
        assert_eq!(truncate_output("héllo wörld", 5), "héllo...");
    }
}
