// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! cutout3d: turn transparent cutout images into flat meshes and point them at targets
//!
//! Usage:
//!   cutout3d convert <dir> [options]
//!   cutout3d orient --normal x,y,z --position x,y,z --target x,y,z [--tilt]

use anyhow::{anyhow, bail, Context, Result};
use cutout3d_geometry::{Oriented, Point3, Vector3};
use cutout3d_processing::{run_batch, ContourPrecision, ConversionConfig, ObjScene};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("convert") => convert(&args[1..]),
        Some("orient") => orient(&args[1..]),
        Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("Unknown command: {}", other)
        }
    }
}

fn convert(args: &[String]) -> Result<()> {
    let mut config = ConversionConfig::from_env();
    let mut dir: Option<PathBuf> = None;
    let mut output = PathBuf::from("scene.obj");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = PathBuf::from(value(args, &mut i)?);
                config = ConversionConfig::from_json_file(&path)
                    .with_context(|| format!("Cannot load config '{}'", path.display()))?;
            }
            "--height" => {
                config.mesh_height = value(args, &mut i)?
                    .parse()
                    .context("Invalid height value")?;
            }
            "--holes" => config.holes_enabled = true,
            "--detailed" => config.contour_precision = ContourPrecision::Detailed,
            "--flat-orientation" => config.vertical_orientation = false,
            "--no-masks" => config.persist_masks = false,
            "--output" => output = PathBuf::from(value(args, &mut i)?),
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            path => {
                if dir.replace(PathBuf::from(path)).is_some() {
                    bail!("Only one input directory may be given");
                }
            }
        }
        i += 1;
    }

    let dir = dir.ok_or_else(|| anyhow!("Missing input directory"))?;

    tracing::info!(
        dir = %dir.display(),
        mesh_height = config.mesh_height,
        holes = config.holes_enabled,
        vertical = config.vertical_orientation,
        precision = ?config.contour_precision,
        "Converting cutouts"
    );

    let mut scene = ObjScene::new();
    let report = run_batch(&dir, &config, &mut scene)?;

    for failure in &report.failures {
        eprintln!("  skipped {}: {}", failure.name, failure.error);
    }
    if scene.is_empty() {
        bail!("No image could be converted");
    }

    scene.write(&output)?;
    println!(
        "Converted {} of {} images into {}",
        report.converted.len(),
        report.converted.len() + report.failures.len(),
        output.display()
    );
    Ok(())
}

fn orient(args: &[String]) -> Result<()> {
    let mut normal: Option<Vector3<f64>> = None;
    let mut position: Option<Point3<f64>> = None;
    let mut target: Option<Point3<f64>> = None;
    let mut tilt = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--normal" => normal = Some(parse_triple(value(args, &mut i)?)?),
            "--position" => position = Some(Point3::from(parse_triple(value(args, &mut i)?)?)),
            "--target" => target = Some(Point3::from(parse_triple(value(args, &mut i)?)?)),
            "--tilt" => tilt = true,
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }

    let normal = normal.ok_or_else(|| anyhow!("Missing --normal"))?;
    let position = position.unwrap_or_else(Point3::origin);
    let target = target.ok_or_else(|| anyhow!("Missing --target"))?;

    let aligned = Oriented::new(normal, position).align(&target)?;
    let (rotation, normal) = if tilt {
        let tilted = aligned.tilt(&target)?;
        (tilted.rotation(), tilted.normal())
    } else {
        (aligned.rotation(), aligned.normal())
    };

    let (roll, pitch, yaw) = rotation.euler_angles();
    println!("rotation axis:   {}", format_axis(&rotation));
    println!("rotation angle:  {:.4}°", rotation.angle().to_degrees());
    println!(
        "euler (xyz):     {:.4}° {:.4}° {:.4}°",
        roll.to_degrees(),
        pitch.to_degrees(),
        yaw.to_degrees()
    );
    println!("new normal:      {:.6} {:.6} {:.6}", normal.x, normal.y, normal.z);
    Ok(())
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing value for {}", flag))
}

fn parse_triple(text: &str) -> Result<Vector3<f64>> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid vector '{}'", text))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => bail!("Expected three comma-separated values, got '{}'", text),
    }
}

fn format_axis(rotation: &cutout3d_geometry::UnitQuaternion<f64>) -> String {
    match rotation.axis() {
        Some(axis) => format!("{:.6} {:.6} {:.6}", axis.x, axis.y, axis.z),
        None => "none".into(),
    }
}

fn print_usage() {
    println!(
        r#"cutout3d - Cutout images to meshes
==================================

USAGE:
  cutout3d convert <dir> [OPTIONS]
  cutout3d orient --normal x,y,z --target x,y,z [--position x,y,z] [--tilt]

CONVERT OPTIONS:
  --config <file>        Load settings from a JSON file
  --height <units>       Mesh height (default: 1.7)
  --holes                Carve holes from nested contours
  --detailed             Keep every boundary pixel instead of corner points
  --flat-orientation     Leave meshes lying in the XY plane
  --no-masks             Do not write alpha masks to "Alpha Channel"
  --output <path>        Output OBJ file (default: scene.obj)

ORIENT OPTIONS:
  --normal x,y,z         Face normal of the object
  --position x,y,z       Object position (default: origin)
  --target x,y,z         Position to face
  --tilt                 Also tilt the face up or down onto the target

ENVIRONMENT:
  CUTOUT3D_MESH_HEIGHT, CUTOUT3D_VERTICAL_ORIENTATION, CUTOUT3D_HOLES,
  CUTOUT3D_CONTOUR_PRECISION, CUTOUT3D_PERSIST_MASKS,
  CUTOUT3D_MASK_DIRECTORY, CUTOUT3D_MASK_SUFFIX
  RUST_LOG               Log filter (default: info)

EXAMPLES:
  cutout3d convert ./art --holes --output forest.obj
  cutout3d orient --normal 0,-1,0 --position 1,2,0 --target 5,5,3 --tilt
"#
    );
}
