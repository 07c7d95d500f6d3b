use crate::platform;
use crate::provision::ProvisionOutcome;

// CLI messages go through tracing so RUST_LOG and NO_COLOR apply to them too
pub fn print_success(message: &str) {
    tracing::info!("✓ {}", message);
}

pub fn print_info(message: &str) {
    tracing::info!("{}", message);
}

pub fn print_warning(message: &str) {
    tracing::warn!("{}", message);
}

/// Log a multi-line block one line at a time.
pub fn print_block(text: &str) {
    for line in text.lines() {
        print_info(line);
    }
}

pub fn dist_info(version: &str) -> String {
    let mut info = format!("Distribution Information\nVersion: {}", version);
    if !platform::DIST_OS.is_empty() {
        info.push_str(&format!("\nOs: {}", platform::DIST_OS));
    }
    if !platform::DIST_ARCH.is_empty() {
        info.push_str(&format!("\nArchitecture: {}", platform::DIST_ARCH));
    }
    info
}

pub fn outcome_summary(outcome: &ProvisionOutcome) -> String {
    let mut lines = vec![
        format!("Role: {} ({})", outcome.role.name, outcome.role.arn),
        format!(
            "Fleet policy: {} ({})",
            outcome.fleet_policy.name, outcome.fleet_policy.arn
        ),
        format!(
            "Bucket policy: {} ({})",
            outcome.bucket_policy.name, outcome.bucket_policy.arn
        ),
    ];

    if outcome.created.is_empty() {
        lines.push("Created: nothing, all resources already existed".to_string());
    } else {
        lines.push(format!("Created: {}", outcome.created.join(", ")));
    }

    if outcome.attached.is_empty() {
        lines.push("Attached: nothing, policies were already attached".to_string());
    } else {
        lines.push(format!("Attached: {}", outcome.attached.join(", ")));
    }

    lines.join("\n")
}
