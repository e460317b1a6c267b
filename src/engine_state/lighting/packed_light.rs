//! Packed four-channel light values and the grid that stores them.
//!
//! Every cell holds one `u16` split into four nibbles:
//!
//! ```text
//! bits 12-15  sun
//! bits  8-11  red
//! bits  4-7   green
//! bits  0-3   blue
//! ```

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::engine_state::voxels::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Highest value any channel can hold.
pub const MAX_LIGHT: u8 = 15;

/// One of the four independent light channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    Sun,
    Red,
    Green,
    Blue,
}

impl LightChannel {
    pub const ALL: [LightChannel; 4] = [
        LightChannel::Sun,
        LightChannel::Red,
        LightChannel::Green,
        LightChannel::Blue,
    ];

    /// The three block-light channels.
    pub const COLORS: [LightChannel; 3] = [LightChannel::Red, LightChannel::Green, LightChannel::Blue];

    #[inline]
    const fn shift(self) -> u16 {
        match self {
            LightChannel::Sun => 12,
            LightChannel::Red => 8,
            LightChannel::Green => 4,
            LightChannel::Blue => 0,
        }
    }
}

/// A cell's light, one nibble per channel.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedLight(pub u16);

impl PackedLight {
    /// No light in any channel.
    pub const DARK: PackedLight = PackedLight(0);
    /// Every channel at 15. Used for faces at the top and bottom of the world.
    pub const FULLY_LIT: PackedLight = PackedLight(0xFFFF);

    /// Builds a value from four channels, clamping each to 15.
    pub fn new(sun: u8, red: u8, green: u8, blue: u8) -> Self {
        let mut light = PackedLight::DARK;
        light.set(LightChannel::Sun, sun);
        light.set(LightChannel::Red, red);
        light.set(LightChannel::Green, green);
        light.set(LightChannel::Blue, blue);
        light
    }

    #[inline]
    pub fn get(self, channel: LightChannel) -> u8 {
        ((self.0 >> channel.shift()) & 0xF) as u8
    }

    /// Overwrites one channel. Values above 15 are clamped.
    #[inline]
    pub fn set(&mut self, channel: LightChannel, value: u8) {
        let shift = channel.shift();
        let value = value.min(MAX_LIGHT) as u16;
        self.0 = (self.0 & !(0xF << shift)) | (value << shift);
    }

    #[inline]
    pub fn sun(self) -> u8 {
        self.get(LightChannel::Sun)
    }

    #[inline]
    pub fn red(self) -> u8 {
        self.get(LightChannel::Red)
    }

    #[inline]
    pub fn green(self) -> u8 {
        self.get(LightChannel::Green)
    }

    #[inline]
    pub fn blue(self) -> u8 {
        self.get(LightChannel::Blue)
    }

    pub fn set_sun(&mut self, value: u8) {
        self.set(LightChannel::Sun, value);
    }

    pub fn set_red(&mut self, value: u8) {
        self.set(LightChannel::Red, value);
    }

    pub fn set_green(&mut self, value: u8) {
        self.set(LightChannel::Green, value);
    }

    pub fn set_blue(&mut self, value: u8) {
        self.set(LightChannel::Blue, value);
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for PackedLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PackedLight(sun: {}, rgb: {}/{}/{})",
            self.sun(),
            self.red(),
            self.green(),
            self.blue()
        )
    }
}

/// Width and depth of a lightmap: the chunk plus one chunk on every side.
pub const LIGHTMAP_WIDTH: usize = 3 * CHUNK_WIDTH;
/// Number of cells in a lightmap.
pub const LIGHTMAP_SIZE: usize = LIGHTMAP_WIDTH * LIGHTMAP_WIDTH * CHUNK_HEIGHT;

/// Light for a chunk's 3x3 footprint.
///
/// Footprint coordinates run `0..LIGHTMAP_WIDTH` horizontally; the owning chunk sits at
/// `CHUNK_WIDTH..2 * CHUNK_WIDTH`.
#[derive(Clone, PartialEq, Eq)]
pub struct LightMap {
    values: Box<[PackedLight]>,
}

impl LightMap {
    /// A completely dark map.
    pub fn new() -> Self {
        LightMap {
            values: vec![PackedLight::DARK; LIGHTMAP_SIZE].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn index(fx: usize, y: usize, fz: usize) -> usize {
        (y * LIGHTMAP_WIDTH + fz) * LIGHTMAP_WIDTH + fx
    }

    /// Light at footprint coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the footprint.
    #[inline]
    pub fn get(&self, fx: usize, y: usize, fz: usize) -> PackedLight {
        self.values[Self::index(fx, y, fz)]
    }

    #[inline]
    pub fn set(&mut self, fx: usize, y: usize, fz: usize, light: PackedLight) {
        self.values[Self::index(fx, y, fz)] = light;
    }

    /// Light at coordinates local to the owning chunk, which may reach one chunk
    /// beyond it horizontally. `None` outside the footprint or the world height.
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Option<PackedLight> {
        let width = CHUNK_WIDTH as i32;
        let fx = x + width;
        let fz = z + width;
        let range = 0..LIGHTMAP_WIDTH as i32;
        if !range.contains(&fx) || !range.contains(&fz) || !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return None;
        }
        Some(self.get(fx as usize, y as usize, fz as usize))
    }

    /// The raw packed values in storage order.
    pub fn as_raw(&self) -> &[u16] {
        bytemuck::cast_slice(&self.values)
    }
}

impl Default for LightMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.values.iter().filter(|light| **light != PackedLight::DARK).count();
        f.debug_struct("LightMap")
            .field("cells", &self.values.len())
            .field("lit", &lit)
            .finish()
    }
}
