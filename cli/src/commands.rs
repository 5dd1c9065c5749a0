//! Command implementations. Output goes to the supplied writer; logs go to
//! stderr through `tracing`.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use facepass_client::{Backend, SessionStore};
use facepass_handover::{
    handover_route, render_handover_code, request_handover_token, PollOutcome, Redeemer,
    StatusPoller,
};
use facepass_types::ModelKind;
use facepass_verification::{ArtifactSource, ModelArtifacts};
use futures_util::future::try_join_all;
use tokio::sync::broadcast;

use crate::config::FacepassConfig;

/// `handover code`: issue a token, show the link, optionally wait for the phone.
pub async fn handover_code(
    out: &mut dyn Write,
    backend: Arc<dyn Backend>,
    config: &FacepassConfig,
    svg: Option<&Path>,
    wait: bool,
    shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<Option<PollOutcome>> {
    // Fail on a bad public url before the backend issues a token.
    handover_route(config.public_url.as_deref())?;
    let token = request_handover_token(backend.as_ref()).await?;
    let code = render_handover_code(&token, config.public_url.as_deref())?;

    match svg {
        Some(path) => {
            std::fs::write(path, code.to_svg())
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "QR code written to {}", path.display())?;
        }
        None => writeln!(out, "{}", code.to_terminal())?,
    }
    writeln!(out, "Scan with your phone or open: {}", code.link())?;

    if !wait {
        return Ok(None);
    }
    writeln!(out, "Waiting for verification on the phone (Ctrl-C to stop)...")?;
    let outcome = StatusPoller::with_period(backend, config.poll_interval())
        .run(shutdown)
        .await;
    match &outcome {
        PollOutcome::Verified(user) => writeln!(out, "Verified! {} can continue.", user.name)?,
        PollOutcome::Cancelled => writeln!(out, "Stopped waiting.")?,
    }
    Ok(Some(outcome))
}

/// `handover redeem`: act as the phone and sign in with a scanned link.
pub async fn handover_redeem(
    out: &mut dyn Write,
    backend: Arc<dyn Backend>,
    link: &str,
) -> anyhow::Result<()> {
    let redeemer = Redeemer::new(backend, Arc::new(SessionStore::new()));
    match redeemer.redeem_link(link).await {
        Ok(redirect) => {
            if let Some(user) = redeemer.session().current() {
                writeln!(out, "Signed in as {} <{}>", user.name, user.email)?;
            }
            writeln!(out, "Next: {}", redirect.route.path())?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{}", e.user_message())?;
            Err(e.into())
        }
    }
}

/// `status`: print the signed-in user's verification flag.
pub async fn status(out: &mut dyn Write, backend: &dyn Backend) -> anyhow::Result<bool> {
    let user = backend
        .current_user()
        .await
        .context("fetching current user")?;
    let state = if user.is_verified {
        "verified"
    } else {
        "not verified"
    };
    writeln!(out, "{} <{}>: {state}", user.name, user.email)?;
    Ok(user.is_verified)
}

/// `models prefetch`: download the pinned artifact set and report its size.
pub async fn models_prefetch(
    out: &mut dyn Write,
    source: &dyn ArtifactSource,
    config: &FacepassConfig,
) -> anyhow::Result<ModelArtifacts> {
    let engine = config.engine_config();
    let spec = &engine.models;
    writeln!(out, "Fetching {} from {}", spec.version, spec.base_url)?;

    let fetched = try_join_all(ModelKind::ALL.iter().map(|kind| source.fetch(spec, *kind)))
        .await
        .context("fetching model artifacts")?;
    for artifact in &fetched {
        writeln!(
            out,
            "  {:<20} {:>4} tensors {:>10} bytes",
            artifact.kind.to_string(),
            artifact.tensor_count(),
            artifact.byte_len()
        )?;
    }

    let set = ModelArtifacts::new(spec.version.clone(), fetched)?;
    writeln!(
        out,
        "Total {} bytes; match threshold {}",
        set.byte_len(),
        engine.match_threshold
    )?;
    Ok(set)
}
