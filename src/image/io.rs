//! I/O helpers for result images and JSON.
//!
//! - `save_grayscale_u8`: write an 8-bit grid to a grayscale PNG.
//! - `save_rgb_u8`: write an RGB grid (debug images) to a PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::Grid;
use crate::error::{AbstractionError, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Convert an 8-bit grid into an `image` buffer.
pub fn to_gray_image(grid: &Grid<u8>) -> GrayImage {
    GrayImage::from_fn(grid.w as u32, grid.h as u32, |x, y| {
        Luma([grid.get(y as usize, x as usize)])
    })
}

pub fn to_rgb_image(grid: &Grid<[u8; 3]>) -> RgbImage {
    RgbImage::from_fn(grid.w as u32, grid.h as u32, |x, y| {
        Rgb(grid.get(y as usize, x as usize))
    })
}

/// Save an 8-bit grid to a grayscale PNG.
pub fn save_grayscale_u8(grid: &Grid<u8>, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    to_gray_image(grid)
        .save(path)
        .map_err(|source| AbstractionError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an RGB grid to a PNG.
pub fn save_rgb_u8(grid: &Grid<[u8; 3]>, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    to_rgb_image(grid)
        .save(path)
        .map_err(|source| AbstractionError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
