//! Releases command - list a project's published versions

use crate::cli::args::{OutputFormat, ReleasesArgs};
use crate::config::Config;
use crate::error::DocResult;
use crate::resolver::DocResolver;
use crate::ui::{self, UiContext};
use console::style;

struct VersionRow {
    version: String,
    url: String,
}

/// Execute the releases command
pub async fn execute(args: ReleasesArgs, config: &Config) -> DocResult<()> {
    let resolver = DocResolver::from_config(config);
    let versions = resolver.list_versions(&args.project, args.refresh).await?;

    let rows: Vec<VersionRow> = versions
        .into_iter()
        .rev()
        .map(|version| VersionRow {
            url: resolver.canonical_url(&args.project, &version),
            version,
        })
        .collect();

    match args.format {
        OutputFormat::Table => print_table(&args.project, &rows),
        OutputFormat::Json => {
            // Same shape as the listing response: an array of tags
            let tags: Vec<&str> = rows.iter().map(|row| row.version.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.version);
            }
        }
    }

    Ok(())
}

fn print_table(project: &str, rows: &[VersionRow]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Releases of {}", project));

    println!("{:<20} {}", style("VERSION").bold(), style("URL").bold());
    println!("{}", "-".repeat(60));
    for row in rows {
        println!("{:<20} {}", row.version, style(&row.url).dim());
    }

    println!();
    println!("{} release(s)", rows.len());
}
