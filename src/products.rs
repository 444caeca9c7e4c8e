//! Finders for the images and plots a direction has produced so far.
//!
//! These only locate files; opening them is left to whatever viewer the
//! caller prefers.

use std::path::{Path, PathBuf};

use crate::artifact::newest_subdirectory;
use crate::direction::Direction;
use crate::gate::SELFCAL_OPERATION;

const PEEL_OPERATIONS: [&str; 2] = ["facetpeel", "outlierpeel"];

/// A full-resolution image and the operation that made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetImage {
    pub path: PathBuf,
    pub operation: String,
}

fn glob_in(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!("{}/{}", glob::Pattern::escape(&dir.to_string_lossy()), pattern);
    match glob::glob(&full) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(e) => {
            log::warn!("Bad glob pattern {}: {}", full, e);
            Vec::new()
        }
    }
}

fn results_dir(direction: &Direction) -> PathBuf {
    direction.working_dir.join("results")
}

/// Glob across `results/<op_pattern>/<direction>` for each file pattern
fn glob_operations(direction: &Direction, op_pattern: &str, file_patterns: &[&str]) -> Vec<PathBuf> {
    let base = format!(
        "{}/{}/{}",
        glob::Pattern::escape(&results_dir(direction).to_string_lossy()),
        op_pattern,
        glob::Pattern::escape(&direction.name)
    );
    let mut found = Vec::new();
    for pattern in file_patterns {
        let full = format!("{}/{}", base, pattern);
        match glob::glob(&full) {
            Ok(paths) => found.extend(paths.filter_map(|p| p.ok())),
            Err(e) => log::warn!("Bad glob pattern {}: {}", full, e),
        }
    }
    found
}

fn operation_of(direction: &Direction, path: &Path) -> String {
    path.strip_prefix(results_dir(direction))
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn selfcal_images_with(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut images = glob_in(dir, &format!("*.wsclean_image[01]2-{}", suffix));
    let mut tec_iterations = glob_in(dir, &format!("*.wsclean_image22_iter*-{}", suffix));
    if tec_iterations.is_empty() {
        tec_iterations = glob_in(dir, &format!("*.wsclean_image22-{}", suffix));
    }
    images.extend(tec_iterations);
    images.extend(glob_in(dir, &format!("*.wsclean_image[3]2-{}", suffix)));
    images.extend(glob_in(dir, &format!("*.wsclean_image42_iter*-{}", suffix)));
    images
}

/// Self-calibration images, in name order.
///
/// Multi-frequency (`-MFS-`) images are preferred; plain images are used
/// only when no MFS image exists.
pub fn selfcal_images(direction: &Direction) -> Vec<PathBuf> {
    let dir = direction.operation(SELFCAL_OPERATION).root;
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut images = selfcal_images_with(&dir, "MFS-image.fits");
    if images.is_empty() {
        images = selfcal_images_with(&dir, "image.fits");
    }
    images.sort();
    images
}

/// Directory holding the latest calibration solutions, if any
fn latest_solutions_dir(direction: &Direction) -> Option<PathBuf> {
    let mut candidates = vec![direction.operation(SELFCAL_OPERATION).root];
    candidates.extend(PEEL_OPERATIONS.iter().map(|op| direction.operation(op).root));
    newest_subdirectory(candidates)
}

/// Fast-phase (TEC) solution plots from the newest calibration run
pub fn selfcal_tec_plots(direction: &Direction) -> Vec<PathBuf> {
    let Some(dir) = latest_solutions_dir(direction) else {
        return Vec::new();
    };
    let mut plots = glob_in(&dir, "*.make_selfcal_plots_tec*.png");
    plots.sort();
    plots
}

/// Slow-gain amplitude and phase plots from the newest calibration run
pub fn selfcal_gain_plots(direction: &Direction) -> Vec<PathBuf> {
    let Some(dir) = latest_solutions_dir(direction) else {
        return Vec::new();
    };
    let mut plots = glob_in(&dir, "*.make_selfcal_plots_amp*.png");
    plots.extend(glob_in(&dir, "*.make_selfcal_plots_phase*.png"));
    plots.sort();
    plots
}

/// Full facet images, or the field mosaics for the field pseudo direction
pub fn facet_images(direction: &Direction) -> Vec<FacetImage> {
    let paths = if direction.is_field() {
        glob_operations(direction, "fieldmosaic*", &["*.correct_mosaic.pbcut.fits"])
    } else {
        let patterns = [
            "*.wsclean_image_full-MFS-image.fits",
            "*.wsclean_image_full-image.fits",
            "*.wsclean_image_full2-MFS-image.fits",
            "*.wsclean_image_full2-image.fits",
        ];
        let mut paths = glob_operations(direction, SELFCAL_OPERATION, &patterns);
        paths.extend(glob_operations(direction, "facetimage*", &patterns));
        paths.extend(glob_operations(direction, "facetpeel", &patterns));
        paths
    };

    paths
        .into_iter()
        .map(|path| FacetImage {
            operation: operation_of(direction, &path),
            path,
        })
        .collect()
}

/// Images made before and after subtraction, used to judge self-calibration
pub fn verify_images(direction: &Direction) -> Vec<PathBuf> {
    let patterns = ["*.wsclean_pre-image.fits", "*.wsclean_post-image.fits"];
    let mut images = glob_operations(direction, SELFCAL_OPERATION, &patterns);
    images.extend(glob_operations(direction, "facetpeel", &patterns));
    images
}
