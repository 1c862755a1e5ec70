//! Latest camera frames.

use tabled::Tabled;

use skywatch_core::panel::MISSING;
use skywatch_core::{Dashboard, Payload, VideoFrame, VideoKind, names};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct FrameRow {
    #[tabled(rename = "Camera")]
    kind: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl From<&VideoFrame> for FrameRow {
    fn from(f: &VideoFrame) -> Self {
        Self {
            kind: f.kind.to_string(),
            updated: util::format_time(f.updated),
            size: f.size_bytes.map_or_else(|| MISSING.into(), |b| format!("{} KiB", b.div_ceil(1024))),
            url: f.url.clone(),
        }
    }
}

pub async fn handle(dashboard: &Dashboard, profile: &str, global: &GlobalOpts) -> Result<(), CliError> {
    util::sign_in(dashboard, profile).await?;

    let mut frames = Vec::new();
    for (kind, name) in [(VideoKind::Raw, names::VIDEO_RAW), (VideoKind::Detection, names::VIDEO_DETECTION)] {
        // Disabled in the profile.
        if util::resource_spec(dashboard, name).is_err() {
            continue;
        }
        let state = util::first_cycle(dashboard, name).await?;
        util::require_value(dashboard, name, &state, profile)?;
        match state.value.as_ref().and_then(Payload::as_video_frame) {
            Some(frame) => frames.push(frame.clone()),
            None => output::note(global, &format!("{kind}: no frame yet")),
        }
    }

    let out = output::render_list(global.output, &frames, |f| FrameRow::from(f), |f| f.url.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
