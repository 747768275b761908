//! # Photo Annotator
//!
//! Fetch a photo, annotate it and save `modified_image.png`.

use std::sync::Arc;

use annotator_app::{
    save_export, spawn_editor, AppConfig, CliArgs, EditorEvent, HttpImageFetcher, PhotoSource,
    UnsplashClient,
};
use annotator_core::ImageDescriptor;
use annotator_renderer::{SurfaceExporter, EXPORT_QUALITY};
use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,annotator_app=debug,annotator_core=debug,annotator_renderer=debug")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from(CliArgs::parse());
    tracing::info!(
        "Viewport {}x{}, output directory {:?}",
        config.viewport.width,
        config.viewport.height,
        config.out_dir
    );

    let descriptor = resolve_photo(&config).await?;
    tracing::info!("Selected photo {} ({})", descriptor.id, descriptor.full_url);

    let fetcher = Arc::new(HttpImageFetcher::new()?);
    let exporter = SurfaceExporter::with_defaults();
    let (_viewport_tx, viewport_rx) = watch::channel(config.viewport);
    let (editor, task) = spawn_editor(viewport_rx, fetcher, exporter);

    let generation = editor
        .select_image(descriptor)
        .await?
        .context("editor has no surface")?;
    match editor.wait_for_load(generation).await? {
        EditorEvent::ImageReady { placement, .. } => tracing::debug!(
            "Photo drawn at ({}, {}) {}x{}",
            placement.left,
            placement.top,
            placement.width,
            placement.height
        ),
        EditorEvent::LoadFailed { reason, .. } => anyhow::bail!("failed to load photo: {reason}"),
        other => anyhow::bail!("photo load did not complete: {other:?}"),
    }

    for caption in &config.captions {
        if let Some(id) = editor.add_text().await? {
            editor.edit_text(id, caption.as_str()).await?;
        }
    }
    for kind in &config.shapes {
        editor.add_shape(*kind).await?;
    }

    if config.snapshot {
        if let Some(snapshot) = editor.snapshot().await? {
            println!("{}", snapshot.to_json()?);
        }
    }

    match editor.export().await? {
        Some(artifact) => {
            let path = save_export(&config.out_dir, &artifact)
                .await
                .with_context(|| format!("failed to save export to {}", config.out_dir.display()))?;
            tracing::info!(
                "Saved {}x{} export to {} (quality hint {})",
                artifact.width,
                artifact.height,
                path.display(),
                EXPORT_QUALITY
            );
        }
        None => tracing::warn!("Nothing to export"),
    }

    drop(editor);
    task.await?;
    tracing::info!("Photo Annotator exited");
    Ok(())
}

/// Turn the configured photo source into a descriptor.
async fn resolve_photo(config: &AppConfig) -> anyhow::Result<ImageDescriptor> {
    match &config.source {
        PhotoSource::Url(url) => Ok(ImageDescriptor::from_url(url.clone())),
        PhotoSource::Search { query, pick } => {
            let client = UnsplashClient::new(
                &config.provider.base_url,
                config.provider.access_key.as_deref(),
            )?;
            let descriptor = client
                .pick(query, *pick)
                .await
                .inspect_err(|e| tracing::error!("Photo search for {:?} failed: {}", query, e))?;
            Ok(descriptor)
        }
    }
}
