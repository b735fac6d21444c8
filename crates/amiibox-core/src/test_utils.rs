//! Shared test utilities for amiibox-core.
//!
//! Provides a scripted [`MockService`] whose state stays inspectable after
//! it is boxed into a session, PNG fixture builders, and a sample storage
//! tree.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use amiibox_platform::{
    ActiveVirtualAmiibo, AmiiboMetadata, ConnectionStatus, EmulationService, EmulationStatus,
    Version,
};
use amiibox_types::error::{AmiiboxError, Result};
use amiibox_vfs::{MemoryVfs, Vfs};

pub const ROOT: &str = "/emuiibo/amiibo";

/// Observable state behind a [`MockService`].
#[derive(Debug)]
pub struct MockState {
    /// Answer of `is_available`.
    pub available: bool,
    /// When false every call after `is_available` fails.
    pub reachable: bool,
    pub initialized: bool,
    pub exit_calls: u32,
    pub initialize_calls: u32,
    pub emulation: EmulationStatus,
    /// Parseable amiibos: path -> name.
    pub amiibos: BTreeMap<String, String>,
    pub active: Option<String>,
    pub connection: ConnectionStatus,
    pub intercepted: bool,
    /// Report `Some` with an empty path instead of `None` when idle.
    pub empty_record_when_idle: bool,
    /// Make `active_virtual_amiibo` fail while reachable.
    pub fail_active_query: bool,
    pub status_queries: u32,
    pub set_active_calls: u32,
    pub set_status_calls: u32,
}

/// Scripted emulation service sharing its state with the test.
pub struct MockService {
    state: Rc<RefCell<MockState>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                available: true,
                reachable: true,
                initialized: false,
                exit_calls: 0,
                initialize_calls: 0,
                emulation: EmulationStatus::Off,
                amiibos: BTreeMap::new(),
                active: None,
                connection: ConnectionStatus::Invalid,
                intercepted: false,
                empty_record_when_idle: false,
                fail_active_query: false,
                status_queries: 0,
                set_active_calls: 0,
                set_status_calls: 0,
            })),
        }
    }

    pub fn with_amiibo(self, path: &str, name: &str) -> Self {
        self.state
            .borrow_mut()
            .amiibos
            .insert(path.to_string(), name.to_string());
        self
    }

    /// Second handle onto the same state, kept by the test.
    pub fn handle(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    fn check(&self) -> Result<()> {
        let s = self.state.borrow();
        if !s.reachable {
            return Err(AmiiboxError::ServiceUnavailable);
        }
        if !s.initialized {
            return Err(AmiiboxError::Service("not initialized".into()));
        }
        Ok(())
    }
}

impl EmulationService for MockService {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    fn initialize(&mut self) -> Result<()> {
        let mut s = self.state.borrow_mut();
        s.initialize_calls += 1;
        if !s.reachable {
            return Err(AmiiboxError::ServiceUnavailable);
        }
        s.initialized = true;
        Ok(())
    }

    fn exit(&mut self) {
        let mut s = self.state.borrow_mut();
        s.exit_calls += 1;
        s.initialized = false;
    }

    fn version(&self) -> Result<Version> {
        self.check()?;
        Ok(Version {
            major: 1,
            minor: 0,
            micro: 2,
            dev_build: false,
        })
    }

    fn emulation_status(&self) -> Result<EmulationStatus> {
        self.check()?;
        Ok(self.state.borrow().emulation)
    }

    fn set_emulation_status(&mut self, status: EmulationStatus) -> Result<()> {
        self.check()?;
        self.state.borrow_mut().emulation = status;
        Ok(())
    }

    fn active_virtual_amiibo(&self) -> Result<Option<ActiveVirtualAmiibo>> {
        self.check()?;
        let s = self.state.borrow();
        if s.fail_active_query {
            return Err(AmiiboxError::Service("query failed".into()));
        }
        match &s.active {
            Some(path) => {
                let name = s.amiibos.get(path).cloned().unwrap_or_default();
                Ok(Some(ActiveVirtualAmiibo {
                    path: path.clone(),
                    metadata: AmiiboMetadata::new(name, path.as_str()),
                }))
            },
            None if s.empty_record_when_idle => Ok(Some(ActiveVirtualAmiibo {
                path: String::new(),
                metadata: AmiiboMetadata::new("stale", ""),
            })),
            None => Ok(None),
        }
    }

    fn set_active_virtual_amiibo(&mut self, path: &str) -> Result<()> {
        self.check()?;
        let mut s = self.state.borrow_mut();
        s.set_active_calls += 1;
        if !s.amiibos.contains_key(path) {
            return Err(AmiiboxError::Service(format!("cannot parse {path}")));
        }
        s.active = Some(path.to_string());
        s.connection = ConnectionStatus::Connected;
        Ok(())
    }

    fn active_virtual_amiibo_status(&self) -> Result<ConnectionStatus> {
        self.state.borrow_mut().status_queries += 1;
        self.check()?;
        Ok(self.state.borrow().connection)
    }

    fn set_active_virtual_amiibo_status(&mut self, status: ConnectionStatus) -> Result<()> {
        self.check()?;
        let mut s = self.state.borrow_mut();
        s.set_status_calls += 1;
        if s.active.is_none() {
            return Err(AmiiboxError::Service("no active amiibo".into()));
        }
        s.connection = status;
        Ok(())
    }

    fn try_parse_virtual_amiibo(&self, path: &str) -> Result<AmiiboMetadata> {
        self.check()?;
        self.state
            .borrow()
            .amiibos
            .get(path)
            .map(|name| AmiiboMetadata::new(name.as_str(), path))
            .ok_or_else(|| AmiiboxError::Service(format!("cannot parse {path}")))
    }

    fn virtual_amiibo_root_directory(&self) -> Result<String> {
        self.check()?;
        Ok(ROOT.to_string())
    }

    fn is_current_application_intercepted(&self) -> Result<bool> {
        self.check()?;
        Ok(self.state.borrow().intercepted)
    }
}

/// Encode raw pixel data as a PNG.
pub fn encode_png(
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
    }
    out
}

/// Pixel `(x, y)` of the generated test pattern.
pub fn pattern_pixel(x: u32, y: u32) -> [u8; 4] {
    [x as u8, y as u8, (x ^ y) as u8, 255]
}

/// RGBA8 image filled with [`pattern_pixel`].
pub fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&pattern_pixel(x, y));
        }
    }
    encode_png(width, height, png::ColorType::Rgba, png::BitDepth::Eight, &data)
}

/// RGB8 image without alpha.
pub fn rgb_png(width: u32, height: u32) -> Vec<u8> {
    let data = vec![0x80u8; (width * height * 3) as usize];
    encode_png(width, height, png::ColorType::Rgb, png::BitDepth::Eight, &data)
}

/// 8-bit grayscale image.
pub fn gray_png(width: u32, height: u32) -> Vec<u8> {
    let data = vec![0x40u8; (width * height) as usize];
    encode_png(
        width,
        height,
        png::ColorType::Grayscale,
        png::BitDepth::Eight,
        &data,
    )
}

/// Flip the IHDR interlace flag of an encoded PNG and fix the chunk CRC.
pub fn mark_interlaced(mut png_data: Vec<u8>) -> Vec<u8> {
    // 8 signature + 4 length + 4 type + 12 header bytes before the flag.
    png_data[28] = 1;
    let crc = crc32(&png_data[12..29]);
    png_data[29..33].copy_from_slice(&crc.to_be_bytes());
    png_data
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// Sample storage plus a mock service that parses the same amiibos.
///
/// ```text
/// /emuiibo/amiibo/
///   link/            leaf, 64x64 RGBA icon
///   smash/           category
///     mario/         leaf, 256x128 RGBA icon
///     rgbicon/       leaf, RGB icon
///     noicon/        leaf, no icon file
///   empty/           category
///   readme.txt       file
/// ```
pub fn fixture() -> (MemoryVfs, MockService) {
    let mut vfs = MemoryVfs::new();
    vfs.write_all("/emuiibo/amiibo/link/amiibo.json", br#"{"name":"Link"}"#)
        .unwrap();
    vfs.write("/emuiibo/amiibo/link/amiibo.png", &rgba_png(64, 64))
        .unwrap();
    vfs.write_all(
        "/emuiibo/amiibo/smash/mario/amiibo.json",
        br#"{"name":"Mario"}"#,
    )
    .unwrap();
    vfs.write("/emuiibo/amiibo/smash/mario/amiibo.png", &rgba_png(256, 128))
        .unwrap();
    vfs.write_all(
        "/emuiibo/amiibo/smash/rgbicon/amiibo.json",
        br#"{"name":"Rgb"}"#,
    )
    .unwrap();
    vfs.write("/emuiibo/amiibo/smash/rgbicon/amiibo.png", &rgb_png(32, 32))
        .unwrap();
    vfs.write_all(
        "/emuiibo/amiibo/smash/noicon/amiibo.json",
        br#"{"name":"NoIcon"}"#,
    )
    .unwrap();
    vfs.mkdir("/emuiibo/amiibo/empty").unwrap();
    vfs.write("/emuiibo/amiibo/readme.txt", b"hello").unwrap();

    let service = MockService::new()
        .with_amiibo("/emuiibo/amiibo/link", "Link")
        .with_amiibo("/emuiibo/amiibo/smash/mario", "Mario")
        .with_amiibo("/emuiibo/amiibo/smash/rgbicon", "Rgb")
        .with_amiibo("/emuiibo/amiibo/smash/noicon", "NoIcon");
    (vfs, service)
}
