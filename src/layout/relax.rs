//! The iterative relaxation seam behind Voronoi subdivision.
//!
//! `CellEngine` is the boundary the recursive orchestration talks to:
//! hand it one weight per site and a convex clipping polygon, get back one
//! cell per site whose areas approximate the weight proportions. The
//! default `PowerDiagram` engine does weighted Lloyd relaxation on a power
//! diagram, carving each cell out of the clip with one half-plane per
//! competing site.

use rand::rngs::StdRng;
use rand::Rng;

use crate::geom::{clip_half_plane, HalfPlane, Point, Polygon, AREA_EPSILON};
use crate::layout::LayoutError;

/// Stop conditions for the relaxation loop.
#[derive(Debug, Clone, Copy)]
pub struct RelaxParams {
    /// Stop when the summed absolute area error drops below this fraction
    /// of the clip polygon's area.
    pub convergence_ratio: f64,
    /// Hard iteration cap regardless of convergence.
    pub max_iterations: u32,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            convergence_ratio: 0.01,
            max_iterations: 50,
        }
    }
}

/// One relaxed cell: the clipped polygon, the site that generated it, and
/// its area (cached, the orchestrator reads it repeatedly).
#[derive(Debug, Clone)]
pub struct Cell {
    pub polygon: Polygon,
    pub site: Point,
    pub area: f64,
}

/// Result of one relaxation run. `converged` is diagnostic only; a capped
/// run still returns usable best-effort cells.
#[derive(Debug)]
pub struct RelaxOutcome {
    pub cells: Vec<Cell>,
    pub iterations: u32,
    pub area_error: f64,
    pub converged: bool,
}

/// Computes one cell per weight inside a convex clipping polygon, with cell
/// areas proportional to the weights within the convergence tolerance.
pub trait CellEngine {
    fn compute_cells(
        &self,
        weights: &[f64],
        clip: &Polygon,
        params: &RelaxParams,
        rng: &mut StdRng,
    ) -> Result<RelaxOutcome, LayoutError>;
}

/// Default engine: power-diagram relaxation.
///
/// Each iteration extracts cells by half-plane clipping, moves every site to
/// its cell centroid, and scales every site's power weight toward its target
/// area. A pairwise guard keeps any one site from swallowing a neighbour's
/// cell entirely.
#[derive(Debug, Default)]
pub struct PowerDiagram;

/// Clamp on the per-iteration weight adaptation ratio; limits overshoot
/// when a cell is far from its target area.
const ADAPT_RATIO_MIN: f64 = 0.25;
const ADAPT_RATIO_MAX: f64 = 4.0;

impl CellEngine for PowerDiagram {
    fn compute_cells(
        &self,
        weights: &[f64],
        clip: &Polygon,
        params: &RelaxParams,
        rng: &mut StdRng,
    ) -> Result<RelaxOutcome, LayoutError> {
        let clip = validated_clip(clip)?;
        let total_area = clip.area();

        if weights.is_empty() {
            return Err(LayoutError::InvalidWeight("no sites to place".into()));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(LayoutError::InvalidWeight(
                "site weights must be positive and finite".into(),
            ));
        }
        let total_weight: f64 = weights.iter().sum();

        let n = weights.len();
        if n == 1 {
            // Nothing to relax: the single site owns the whole clip.
            return Ok(RelaxOutcome {
                cells: vec![Cell {
                    site: clip.centroid(),
                    area: total_area,
                    polygon: clip,
                }],
                iterations: 0,
                area_error: 0.0,
                converged: true,
            });
        }

        let targets: Vec<f64> = weights
            .iter()
            .map(|w| w / total_weight * total_area)
            .collect();

        // Floor for power weights; also the reset value for repaired sites.
        let floor = total_area * 1e-6;

        let mut sites: Vec<Point> = (0..n).map(|_| random_point_inside(&clip, rng)).collect();
        // Seeding powers at the target areas puts the first diagram close to
        // the answer; the overweight guard trims whatever is too greedy.
        let mut powers: Vec<f64> = targets.iter().map(|t| t.max(floor)).collect();

        let mut cells = Vec::new();
        let mut iterations = 0;
        let mut area_error = f64::INFINITY;
        let mut converged = false;

        while iterations < params.max_iterations {
            iterations += 1;

            guard_overweighted(&sites, &mut powers, floor);
            cells = extract_cells(&sites, &powers, &clip);

            // A site that lost its entire cell gets re-seeded and starts over
            // from the floor weight.
            let mut repaired = false;
            for i in 0..n {
                if cells[i].area <= AREA_EPSILON {
                    sites[i] = random_point_inside(&clip, rng);
                    powers[i] = floor;
                    repaired = true;
                }
            }
            if repaired {
                continue;
            }

            area_error = targets
                .iter()
                .zip(&cells)
                .map(|(t, c)| (t - c.area).abs())
                .sum();
            if area_error < params.convergence_ratio * total_area {
                converged = true;
                break;
            }

            // Lloyd step + weight adaptation.
            for i in 0..n {
                sites[i] = cells[i].polygon.centroid();
                let ratio = (targets[i] / cells[i].area).clamp(ADAPT_RATIO_MIN, ADAPT_RATIO_MAX);
                powers[i] = (powers[i] * ratio).max(floor);
            }
        }

        // Best-effort fallback: if the cap landed on a repair round, degrade
        // to an unweighted diagram so every site still gets a positive cell.
        if cells.len() != n || cells.iter().any(|c| c.area <= AREA_EPSILON) {
            powers = vec![floor; n];
            cells = extract_cells(&sites, &powers, &clip);
            converged = false;
        }

        if !converged {
            tracing::debug!(
                "relaxation hit iteration cap ({} sites, residual area error {:.4} of {:.4})",
                n,
                area_error,
                total_area
            );
        }

        Ok(RelaxOutcome {
            cells,
            iterations,
            area_error,
            converged,
        })
    }
}

/// Reject under-specified or zero-area clips; normalize winding so the
/// half-plane clipper sees a counter-clockwise ring.
fn validated_clip(clip: &Polygon) -> Result<Polygon, LayoutError> {
    if clip.len() < 3 {
        return Err(LayoutError::InvalidPolygon(format!(
            "clipping polygon needs at least 3 vertices, got {}",
            clip.len()
        )));
    }
    if clip.area() <= AREA_EPSILON {
        return Err(LayoutError::InvalidPolygon(
            "clipping polygon encloses zero area".into(),
        ));
    }
    let mut normalized = clip.clone();
    normalized.normalize_ccw();
    Ok(normalized)
}

/// Power-diagram cell of site `i`: the clip intersected with one half-plane
/// per competing site `j`, keeping points where
/// `|x - p_i|^2 - w_i <= |x - p_j|^2 - w_j`.
fn extract_cells(sites: &[Point], powers: &[f64], clip: &Polygon) -> Vec<Cell> {
    let n = sites.len();
    let mut cells = Vec::with_capacity(n);

    for i in 0..n {
        let pi = sites[i];
        let mut poly = clip.clone();
        for j in 0..n {
            if j == i || poly.is_empty() {
                continue;
            }
            let pj = sites[j];
            let ax = 2.0 * (pj.x - pi.x);
            let ay = 2.0 * (pj.y - pi.y);
            let b = (pj.x * pj.x + pj.y * pj.y - powers[j])
                - (pi.x * pi.x + pi.y * pi.y - powers[i]);
            poly = clip_half_plane(&poly, &HalfPlane::new(ax, ay, b));
        }
        let area = poly.area();
        cells.push(Cell {
            polygon: poly,
            site: pi,
            area,
        });
    }

    cells
}

/// Clamp power weights so no site's dominance region swallows a neighbour:
/// `w_i >= d(i,j)^2 + w_j` would leave site `j` with an empty cell.
fn guard_overweighted(sites: &[Point], powers: &mut [f64], floor: f64) {
    let n = sites.len();
    let mut passes = 0;
    loop {
        let mut changed = false;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d2 = sites[i].dist2(sites[j]);
                if powers[i] - powers[j] >= d2 {
                    powers[i] = (powers[j] + d2 * 0.999).max(floor);
                    changed = true;
                }
            }
        }
        passes += 1;
        if !changed || passes > n {
            break;
        }
    }
}

/// Rejection-sample a point inside a convex polygon; falls back to the
/// centroid if the bounding box keeps missing.
fn random_point_inside(clip: &Polygon, rng: &mut StdRng) -> Point {
    let (min, max) = clip.bounding_box();
    for _ in 0..64 {
        let p = Point::new(
            rng.gen_range(min.x..=max.x),
            rng.gen_range(min.y..=max.y),
        );
        if clip.contains(p) {
            return p;
        }
    }
    clip.centroid()
}
