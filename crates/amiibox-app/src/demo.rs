//! Sample virtual amiibo storage for `--demo` runs.

use anyhow::Result;

use amiibox_core::vfs::{MemoryVfs, join};

/// Directory the desktop service serves amiibos from.
pub const AMIIBO_ROOT: &str = "/emuiibo/amiibo";

/// Category, name, icon color. `None` color writes an RGB icon without
/// alpha, which the overlay reports instead of drawing.
const DEMO_AMIIBOS: &[(&str, &str, Option<[u8; 3]>)] = &[
    ("", "Isabelle", Some([250, 210, 90])),
    ("Smash", "Mario", Some([220, 40, 40])),
    ("Smash", "Kirby", Some([245, 150, 190])),
    ("Smash", "Pikachu", None),
    ("Zelda", "Link", Some([60, 160, 70])),
    ("Zelda", "Zelda", Some([150, 110, 200])),
];

/// Fill `vfs` with demo amiibo directories and generated icons.
pub fn populate_demo_vfs(vfs: &mut MemoryVfs) -> Result<()> {
    for &(category, name, color) in DEMO_AMIIBOS {
        let parent = if category.is_empty() {
            AMIIBO_ROOT.to_string()
        } else {
            join(AMIIBO_ROOT, category)
        };
        let dir = join(&parent, &name.to_lowercase());
        let descriptor = format!("{{\"name\":\"{name}\"}}");
        vfs.write_all(&join(&dir, "amiibo.json"), descriptor.as_bytes())?;
        let icon = match color {
            Some(rgb) => badge_icon(64, rgb)?,
            None => flat_rgb_icon(64)?,
        };
        vfs.write_all(&join(&dir, "amiibo.png"), &icon)?;
    }
    // A category with nothing in it yet.
    vfs.write_all(&join(AMIIBO_ROOT, "Splatoon/.keep"), b"")?;
    log::info!("Demo storage ready with {} amiibos", DEMO_AMIIBOS.len());
    Ok(())
}

/// Filled circle on a transparent background.
fn badge_icon(size: u32, rgb: [u8; 3]) -> Result<Vec<u8>> {
    let center = size as i64 / 2;
    let radius = center - 2;
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size as i64 {
        for x in 0..size as i64 {
            let (dx, dy) = (x - center, y - center);
            let alpha = if dx * dx + dy * dy <= radius * radius { 255 } else { 0 };
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], alpha]);
        }
    }
    encode(size, png::ColorType::Rgba, &data)
}

fn flat_rgb_icon(size: u32) -> Result<Vec<u8>> {
    let data = vec![0xC0u8; (size * size * 3) as usize];
    encode(size, png::ColorType::Rgb, &data)
}

fn encode(size: u32, color: png::ColorType, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, size, size);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
        writer.finish()?;
    }
    Ok(out)
}
