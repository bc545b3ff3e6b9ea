//! Resolve command - locate (and if needed build) a version's docs

use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::{Config, ConfigManager};
use crate::error::DocResult;
use crate::resolver::{DocResolver, LATEST};
use crate::ui::{self, TaskSpinner, UiContext};
use serde::Serialize;

#[derive(Serialize)]
struct Resolution {
    project: String,
    version: String,
    location: String,
    url: String,
    /// Where a request for `latest` should be redirected
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
    built: bool,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> DocResult<()> {
    let ctx = UiContext::detect();
    ConfigManager::ensure_build_dirs(config).await?;

    let resolver = DocResolver::from_config(config);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Resolving {}@{}...", args.project, args.tag));
    let artifact = match resolver.resolve(&args.project, &args.tag).await {
        Ok(artifact) => artifact,
        Err(e) => {
            spinner.stop_error(&format!("Could not resolve {}", args.project));
            return Err(e);
        }
    };
    if artifact.built {
        spinner.stop(&format!("Built {} {}", artifact.project, artifact.version));
    } else {
        spinner.stop(&format!("Found {} {}", artifact.project, artifact.version));
    }

    let url = resolver.canonical_url(&artifact.project, &artifact.version);
    let resolution = Resolution {
        redirect: (args.tag == LATEST).then(|| url.clone()),
        url,
        location: artifact.location.display().to_string(),
        project: artifact.project,
        version: artifact.version,
        built: artifact.built,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
        OutputFormat::Plain => println!("{}", resolution.location),
        OutputFormat::Table => {
            ui::key_value(&ctx, "Version", &resolution.version);
            ui::key_value(&ctx, "Location", &resolution.location);
            ui::key_value(&ctx, "URL", &resolution.url);
            if let Some(redirect) = &resolution.redirect {
                ui::remark(&ctx, &format!("latest redirects to {}", redirect));
            }
        }
    }

    Ok(())
}
