//! Channels command - list release channels and their pinned versions

use anyhow::Result;
use colored::*;
use xwalk_config::ReleaseChannel;

/// Print the channel table
pub fn run(json: bool) -> Result<()> {
    if json {
        let channels: Vec<_> = ReleaseChannel::all()
            .iter()
            .map(|channel| {
                serde_json::json!({
                    "channel": channel.name(),
                    "bundle_version": channel.default_artifact_version(),
                    "requires_cordova_android": channel.required_platform_version(),
                    "default": *channel == ReleaseChannel::default(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&channels)?);
        return Ok(());
    }

    println!(
        "{:<10} {:<16} {}",
        "CHANNEL".bold(),
        "BUNDLE".bold(),
        "REQUIRES cordova-android".bold()
    );
    for channel in ReleaseChannel::all() {
        let marker = if channel == ReleaseChannel::default() {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:<10} {:<16} {}{}",
            channel.name(),
            channel.default_artifact_version(),
            channel.required_platform_version(),
            marker
        );
    }

    Ok(())
}
