/*
 *  display/drivers/linuxfb.rs
 *
 *  OctoMon - printer status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux framebuffer driver (/dev/fbN, memory mapped)
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{info, warn};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use crate::config::DisplayConfig;
use crate::display::color::{BACKGROUND, write_pixel};
use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::system::Backlight;
use crate::vframebuf::VarFrameBuf;

// linux/fb.h
const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// struct fb_var_screeninfo
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// struct fb_fix_screeninfo
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
struct FbFixScreeninfo {
    id: [libc::c_char; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// Visible geometry of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// bytes per line
    pub stride: usize,
    /// byte offset of the visible page inside the device memory
    pub offset: usize,
}

/// Visible size from xres/yres, never the virtual size: double buffered
/// panels report a virtual height twice the real one.
fn geometry_from(var: &FbVarScreeninfo, fix: &FbFixScreeninfo) -> FbGeometry {
    let bytes = var.bits_per_pixel as usize / 8;
    let stride = if fix.line_length > 0 {
        fix.line_length as usize
    } else {
        var.xres as usize * bytes
    };
    FbGeometry {
        width: var.xres,
        height: var.yres,
        bits_per_pixel: var.bits_per_pixel,
        stride,
        offset: var.yoffset as usize * stride + var.xoffset as usize * bytes,
    }
}

/// Asks the kernel for the screen info of `device`.
pub fn probe_geometry(device: &Path) -> io::Result<FbGeometry> {
    let file = File::open(device)?;
    let fd = file.as_raw_fd();
    let mut var = FbVarScreeninfo::default();
    let mut fix = FbFixScreeninfo::default();
    // SAFETY: both structs are laid out as in linux/fb.h and outlive the calls
    unsafe {
        if libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut var as *mut FbVarScreeninfo) < 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &mut fix as *mut FbFixScreeninfo) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(geometry_from(&var, &fix))
}

pub struct LinuxFbDriver {
    device: PathBuf,
    geometry: FbGeometry,
    capabilities: DisplayCapabilities,
    framebuffer: VarFrameBuf<Rgb565>,
    map: Option<MmapMut>,
    backlight: Option<Backlight>,
}

impl LinuxFbDriver {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let geometry = match probe_geometry(&config.framebuffer) {
            Ok(g) => {
                if (g.width, g.height) != (config.width, config.height) {
                    info!(
                        "{} is {}x{}, configured {}x{}; using the device size",
                        config.framebuffer.display(), g.width, g.height, config.width, config.height
                    );
                }
                g
            }
            Err(e) => {
                warn!("No screen info for {} ({}), assuming {}x{} 16bpp",
                    config.framebuffer.display(), e, config.width, config.height);
                FbGeometry {
                    width: config.width,
                    height: config.height,
                    bits_per_pixel: 16,
                    stride: config.width as usize * 2,
                    offset: 0,
                }
            }
        };
        Self::with_geometry(config, geometry)
    }

    pub fn with_geometry(config: &DisplayConfig, geometry: FbGeometry) -> Result<Self, DisplayError> {
        let color_depth = match geometry.bits_per_pixel {
            16 => ColorDepth::Rgb565,
            32 => ColorDepth::Xrgb8888,
            other => return Err(DisplayError::UnsupportedPixelFormat(other)),
        };
        let min_stride = geometry.width as usize * color_depth.bytes_per_pixel();
        if geometry.stride < min_stride {
            return Err(DisplayError::InvalidConfiguration(format!(
                "stride {} shorter than a row ({} bytes)", geometry.stride, min_stride
            )));
        }

        let capabilities = DisplayCapabilities {
            width: geometry.width,
            height: geometry.height,
            color_depth,
            max_fps: 30,
            supports_brightness: config.backlight.is_some(),
        };

        Ok(Self {
            device: config.framebuffer.clone(),
            geometry,
            framebuffer: VarFrameBuf::new(geometry.width, geometry.height, BACKGROUND),
            capabilities,
            map: None,
            backlight: config.backlight.clone().map(Backlight::new),
        })
    }

    fn map_len(&self) -> usize {
        self.geometry.offset + self.geometry.stride * self.geometry.height as usize
    }
}

impl DisplayDriver for LinuxFbDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(|e| DisplayError::InitializationFailed(format!("{}: {}", self.device.display(), e)))?;
        let len = self.map_len();
        // SAFETY: the mapping is private to this driver and only touched through flush_area
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        if map.len() < len {
            return Err(DisplayError::BufferSizeMismatch { expected: len, actual: map.len() });
        }
        info!(
            "Framebuffer {} mapped: {}x{} {:?}, stride {}",
            self.device.display(), self.geometry.width, self.geometry.height,
            self.capabilities.color_depth, self.geometry.stride
        );
        self.map = Some(map);
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        match &self.backlight {
            Some(bl) => Ok(bl.set(value)?),
            None => Err(DisplayError::UnsupportedOperation),
        }
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let full = Rectangle::new(Point::zero(), Size::new(self.geometry.width, self.geometry.height));
        self.flush_area(&full)
    }

    fn flush_area(&mut self, area: &Rectangle) -> Result<(), DisplayError> {
        let Some(map) = self.map.as_mut() else {
            return Err(DisplayError::Other("framebuffer not initialised".to_string()));
        };
        let depth = self.capabilities.color_depth;
        let bpp = depth.bytes_per_pixel();
        for (y, x0, row) in self.framebuffer.rows(area) {
            let mut off = self.geometry.offset + y * self.geometry.stride + x0 * bpp;
            for px in row {
                write_pixel(depth, *px, &mut map[off..off + bpp]);
                off += bpp;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear_color(BACKGROUND);
        self.flush()
    }
}

impl DrawTarget for LinuxFbDriver {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.framebuffer.fill_contiguous(area, colors)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }
}

impl OriginDimensions for LinuxFbDriver {
    fn size(&self) -> Size {
        Size::new(self.geometry.width, self.geometry.height)
    }
}
