//! Plain-text rendering of an overlay frame.

use std::fmt::Write;

use amiibox_core::overlay::{FocusRegion, OverlayFrame};
use amiibox_core::thumbnail::Thumbnail;
use amiibox_core::view::RowKind;

fn marker(focused: bool) -> &'static str {
    if focused { ">" } else { " " }
}

fn describe_thumbnail(thumb: &Thumbnail) -> String {
    match thumb {
        Thumbnail::Empty => "-".to_string(),
        Thumbnail::Ready { image, .. } => {
            format!("{}x{} (scale {:.2})", image.width, image.height, image.scale)
        },
        Thumbnail::Failed { error, .. } => format!("[{error}]"),
    }
}

/// Render `frame` as a block of text.
pub fn render_frame(frame: &OverlayFrame<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", frame.title);
    for line in frame.status.lines() {
        let _ = writeln!(out, "   {line}");
    }
    if !frame.initialized {
        return out;
    }

    let _ = writeln!(
        out,
        "{} Emulation [{}]",
        marker(frame.region == FocusRegion::EmulationToggle),
        frame.emulation
    );
    let label = if frame.active_label.is_empty() {
        String::new()
    } else {
        format!(" ({})", frame.active_label)
    };
    let _ = writeln!(
        out,
        "{} {}{label}  icon: {}",
        marker(frame.region == FocusRegion::ActiveSummary),
        frame.active_name,
        describe_thumbnail(frame.active_thumbnail)
    );

    let _ = writeln!(out, "-- {} --", frame.subtitle);
    if let Some(location) = &frame.location {
        let _ = writeln!(out, "   in {location}");
    }
    if frame.rows.is_empty() {
        let _ = writeln!(out, "   (empty)");
    }
    for row in &frame.rows {
        let tag = match row.kind {
            RowKind::Root => "[root]",
            RowKind::Category => "[dir] ",
            RowKind::Amiibo if row.active => "  *   ",
            RowKind::Amiibo => "      ",
        };
        let _ = writeln!(out, "{} {tag} {}", marker(row.focused), row.label);
    }
    if !frame.focused_thumbnail.is_empty() {
        let _ = writeln!(
            out,
            "   focused icon: {}",
            describe_thumbnail(frame.focused_thumbnail)
        );
    }
    out
}
