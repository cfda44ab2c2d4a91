use colored::Colorize;
use hwcloud_core::{Outcome, StatusKind};
use hwcloud_mrs::{ClusterInfo, GroupUpdate};

pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::NoChange => println!("{}", "No change requested, nothing submitted".dimmed()),
        Outcome::Completed {
            action,
            handle,
            status,
            completed_at,
        } => {
            let state = match status.kind {
                StatusKind::Gone => "deleted".to_string(),
                _ => status.label_str().to_string(),
            };
            println!(
                "{} {} {} ({}) at {}",
                "✓".green(),
                action.to_string().bold(),
                handle.to_string().cyan(),
                state.green(),
                completed_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }
}

pub fn print_plan(updates: &[GroupUpdate]) {
    if updates.is_empty() {
        println!("{}", "Node layout unchanged".dimmed());
        return;
    }

    println!("{}", format!("{:<32} {:>8} {:>8}", "GROUP", "CURRENT", "DESIRED").bold());
    println!("{}", "─".repeat(50).dimmed());
    for update in updates {
        let current = update
            .current
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        let desired = if update.is_growth() {
            update.desired.to_string().green()
        } else {
            update.desired.to_string().yellow()
        };
        println!("{:<32} {:>8} {:>8}", update.group, current, desired);
    }
}

pub fn print_cluster(info: &ClusterInfo) {
    let state = if info.is_running() {
        info.state.green()
    } else {
        info.state.yellow()
    };
    println!("{}  {}", info.id.cyan(), info.name.bold());
    println!("  state:      {}", state);
    if let Some(cluster_type) = &info.cluster_type {
        println!("  type:       {}", cluster_type);
    }
    let components: Vec<&str> = info.components.iter().map(|c| c.name.as_str()).collect();
    println!("  components: {}", components.join(", "));
    if let Some(desc) = &info.stage_desc {
        println!("  stage:      {}", desc.dimmed());
    }
}
