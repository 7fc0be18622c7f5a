use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use vitrine_core::{Commit, PageComposer};
use vitrine_dev_server::{LiveServer, LiveServerConfig, PreviewHub};

use super::load_project;
use crate::config::VitrineConfig;

pub fn make_subcommand() -> Command {
    super::add_render_args(super::add_project_args(Command::new("serve")))
        .about("Start the live preview server")
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Port to serve on [default: 3000]")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = VitrineConfig::load(args)?;
    let build_config = config.build_config().clone();
    let project_path = PathBuf::from(&build_config.project);

    let hub = PreviewHub::new(PageComposer::new(config.render_options().clone())?);
    match load_project(&project_path) {
        Ok(project) => {
            hub.publish(project).await?;
        }
        Err(e) => tracing::warn!("{:#}; waiting for a valid project", e),
    }

    let server = LiveServer::new(
        LiveServerConfig {
            host: build_config.host,
            port: build_config.port,
            assets: Some(PathBuf::from(&build_config.assets)),
            open: build_config.open,
        },
        hub.clone(),
    );
    supervise(server.run(), watch_project(project_path, hub)).await
}

/// Run the server and the watcher side by side until either one ends, then
/// stop the other. The first task's outcome is the command's outcome.
async fn supervise<S, W>(server: S, watcher: W) -> Result<()>
where
    S: Future<Output = Result<()>> + Send + 'static,
    W: Future<Output = Result<()>> + Send + 'static,
{
    let mut server_handle = tokio::spawn(server);
    let mut watcher_handle = tokio::spawn(watcher);

    tokio::select! {
        result = &mut server_handle => {
            watcher_handle.abort();
            result?.context("Dev server stopped")
        }
        result = &mut watcher_handle => {
            server_handle.abort();
            result?.context("Project watcher stopped")
        }
    }
}

/// Re-render whenever the project file changes. A document that fails to
/// parse leaves the last good preview on screen.
async fn watch_project(project_path: PathBuf, hub: PreviewHub) -> Result<()> {
    let watch_dir = project_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = project_path.file_name().map(|name| name.to_os_string());

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut debouncer = new_debouncer(
        Duration::from_millis(250),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    let _ = tx.blocking_send(event.path);
                }
            }
            Err(e) => tracing::warn!("Watch error: {}", e),
        },
    )?;

    // Editors often replace the file instead of writing it, so watch the directory.
    debouncer
        .watcher()
        .watch(&watch_dir, notify::RecursiveMode::NonRecursive)?;
    tracing::info!("Watching project file: {}", project_path.display());

    while let Some(path) = rx.recv().await {
        if path.file_name().map(|name| name.to_os_string()) != file_name {
            continue;
        }

        let project = match load_project(&project_path) {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!("{:#}; keeping the last good preview", e);
                continue;
            }
        };

        let ticket = hub.begin();
        let hub = hub.clone();
        tokio::spawn(async move {
            match hub.render(ticket, project).await {
                Ok(Commit::Applied) => tracing::info!("Preview re-rendered"),
                Ok(Commit::Stale { latest, .. }) => tracing::debug!(
                    ticket = ticket.sequence(),
                    latest = latest.sequence(),
                    "Superseded render dropped"
                ),
                Err(e) => tracing::warn!("Render error: {}", e),
            }
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_failure_ends_the_command() {
        let server = async { Err(anyhow::anyhow!("address in use")) };
        let watcher = std::future::pending::<Result<()>>();

        let result = tokio::time::timeout(Duration::from_secs(5), supervise(server, watcher))
            .await
            .expect("supervise should return once the server fails");

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("address in use"));
    }

    #[tokio::test]
    async fn watcher_failure_ends_the_command() {
        let server = std::future::pending::<Result<()>>();
        let watcher = async { Err(anyhow::anyhow!("watch failed")) };

        let result = tokio::time::timeout(Duration::from_secs(5), supervise(server, watcher))
            .await
            .expect("supervise should return once the watcher fails");
        assert!(result.is_err());
    }
}
