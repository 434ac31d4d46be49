// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face-towards orientation solver
//!
//! Turns an object so its face normal points at a target in two phases:
//!
//! 1. **Align** - rotate about the vertical axis until the normal's heading
//!    matches the target's heading.
//! 2. **Tilt** - rotate inside the vertical plane through the target until
//!    the normal points straight at it.
//!
//! The phases are tracked by the [`Oriented`] typestate, so `tilt` can only
//! be called on an aligned object. [`alignment_angles`] and
//! [`tilt_rotation`] expose the same maths without the state wrapper.

use crate::error::{Error, Result};
use crate::vector::{clamped_angle, flip, horizontal, normalize, project_onto_plane, spanned_plane_normal};
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::marker::PhantomData;

/// Largest heading error accepted by the tilt phase
pub const FACING_TOLERANCE: f64 = PI / 180.0;

/// Angles between a face normal and a target direction, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    /// Signed heading correction about +Z, positive counter-clockwise
    pub xy_angle: f64,
    /// Angle between the normal projected into the target's vertical plane and the target
    pub tilt_angle: f64,
    /// Elevation of the target above (or below) its horizontal projection
    pub azimuth_angle: f64,
}

impl AlignmentResult {
    /// Whether the heading is within [`FACING_TOLERANCE`] of the target
    pub fn is_facing(&self) -> bool {
        self.xy_angle.abs() <= FACING_TOLERANCE
    }

    /// Tilt angle with the below-target sign flip and backward-facing fold applied
    ///
    /// `target_above` is true when the target sits higher than the object.
    /// For objects facing away from the target (|xy_angle| > 90°) the
    /// principal `acos` range cannot tell tilting up from tilting down; the
    /// angle is moved onto the complementary branch when the flipped target
    /// is steeper than the projected normal and folded with the azimuth.
    pub fn corrected_tilt(&self, normal: &Vector3<f64>, target: &Vector3<f64>, target_above: bool) -> f64 {
        let mut azimuth = self.azimuth_angle;
        let mut tilt = self.tilt_angle;

        if target_above {
            azimuth = -azimuth;
            tilt = -tilt;
        }

        if self.xy_angle.abs() > FRAC_PI_2 {
            let flipped_z = normalize(&flip(target)).map_or(0.0, |v| v.z);
            let projected_z = spanned_plane_normal(target, &horizontal(target))
                .and_then(|m| normalize(&project_onto_plane(normal, &m)))
                .map_or(0.0, |v| v.z);

            if flipped_z.abs() > projected_z.abs() {
                if tilt < 0.0 {
                    tilt = -TAU - tilt;
                } else if tilt > 0.0 {
                    tilt = TAU - tilt;
                }
            }
            tilt = PI + 2.0 * azimuth.abs() - tilt.abs();
        }

        tilt
    }
}

/// Compute heading, azimuth and tilt between `normal` and `target`
///
/// `target` is the direction from the object to the target position.
/// Fails with [`Error::PerpendicularOrient`] when either vector is vertical,
/// since the heading is then undefined.
pub fn alignment_angles(normal: &Vector3<f64>, target: &Vector3<f64>) -> Result<AlignmentResult> {
    let normal_xy = horizontal(normal);
    let target_xy = horizontal(target);

    let mut xy_angle = clamped_angle(&normal_xy, &target_xy).ok_or(Error::PerpendicularOrient)?;
    if normal_xy.x * target_xy.y - normal_xy.y * target_xy.x < 0.0 {
        xy_angle = -xy_angle;
    }

    let azimuth_angle = clamped_angle(target, &target_xy).ok_or(Error::PerpendicularOrient)?;

    let plane = spanned_plane_normal(target, &target_xy).ok_or(Error::PerpendicularOrient)?;
    let projected = project_onto_plane(normal, &plane);
    // A normal perpendicular to the target plane is a quarter turn from any direction in it
    let tilt_angle = clamped_angle(&projected, target).unwrap_or(FRAC_PI_2);

    Ok(AlignmentResult {
        xy_angle,
        tilt_angle,
        azimuth_angle,
    })
}

/// Rotation of the tilt phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltRotation {
    /// Horizontal axis perpendicular to the target's vertical plane
    pub axis: Unit<Vector3<f64>>,
    /// Signed angle about `axis`
    pub angle: f64,
    pub quaternion: UnitQuaternion<f64>,
}

/// Compute the tilt that points an aligned `normal` at `target_position`
///
/// Fails with [`Error::NotFacingTowards`] unless the heading is already
/// within [`FACING_TOLERANCE`] of the target.
pub fn tilt_rotation(
    normal: &Vector3<f64>,
    object_position: &Point3<f64>,
    target_position: &Point3<f64>,
) -> Result<TiltRotation> {
    let target = target_position - object_position;
    let angles = alignment_angles(normal, &target)?;

    if !angles.is_facing() {
        return Err(Error::NotFacingTowards {
            xy_angle_deg: angles.xy_angle.to_degrees(),
        });
    }

    let target_above = object_position.z < target_position.z;
    let tilt = angles.corrected_tilt(normal, &target, target_above);

    let axis = spanned_plane_normal(&target, &horizontal(&target)).ok_or(Error::PerpendicularOrient)?;

    let target_z = normalize(&target).map_or(0.0, |t| t.z);
    let angle = if target_z > normal.z {
        tilt
    } else if target_z < normal.z {
        -tilt
    } else {
        0.0
    };

    tracing::trace!(
        xy = angles.xy_angle.to_degrees(),
        azimuth = angles.azimuth_angle.to_degrees(),
        tilt = angle.to_degrees(),
        "tilt rotation"
    );

    Ok(TiltRotation {
        axis,
        angle,
        quaternion: UnitQuaternion::from_axis_angle(&axis, angle),
    })
}

/// Orientation phase: heading not yet corrected
#[derive(Debug, Clone, Copy)]
pub struct Unaligned;

/// Orientation phase: heading matches the target
#[derive(Debug, Clone, Copy)]
pub struct Aligned;

/// Orientation phase: normal points at the target
#[derive(Debug, Clone, Copy)]
pub struct Tilted;

/// An object's face normal and position, tagged with its orientation phase
///
/// `rotation` accumulates every rotation applied so far and can be applied
/// to the object's mesh about its origin.
#[derive(Debug, Clone, Copy)]
pub struct Oriented<S> {
    normal: Vector3<f64>,
    position: Point3<f64>,
    rotation: UnitQuaternion<f64>,
    _state: PhantomData<S>,
}

impl<S> Oriented<S> {
    /// Current face normal
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn position(&self) -> Point3<f64> {
        self.position
    }

    /// Total rotation applied since construction
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation
    }

    fn rotated<T>(self, rotation: UnitQuaternion<f64>) -> Oriented<T> {
        Oriented {
            normal: rotation * self.normal,
            position: self.position,
            rotation: rotation * self.rotation,
            _state: PhantomData,
        }
    }
}

impl Oriented<Unaligned> {
    pub fn new(normal: Vector3<f64>, position: Point3<f64>) -> Self {
        Self {
            normal,
            position,
            rotation: UnitQuaternion::identity(),
            _state: PhantomData,
        }
    }

    /// Rotate about +Z so the normal's heading matches the target's
    pub fn align(self, target_position: &Point3<f64>) -> Result<Oriented<Aligned>> {
        let angles = alignment_angles(&self.normal, &(target_position - self.position))?;
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.xy_angle);
        Ok(self.rotated(rotation))
    }
}

impl Oriented<Aligned> {
    /// Rotate inside the target's vertical plane so the normal points at it
    ///
    /// The heading is re-checked, so a target that moved since alignment
    /// fails with [`Error::NotFacingTowards`].
    pub fn tilt(self, target_position: &Point3<f64>) -> Result<Oriented<Tilted>> {
        let tilt = tilt_rotation(&self.normal, &self.position, target_position)?;
        Ok(self.rotated(tilt.quaternion))
    }
}
