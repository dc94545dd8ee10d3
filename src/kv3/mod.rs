//! Text generation for the downstream `.vmat` material and `.vmdl` model
//! descriptors. Pure templating over already-computed paths.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::descriptor::MaterialParams;
use crate::geometry::ModelData;
use crate::texture_pipeline::{DerivedTextureSet, DETAIL_FINAL, DETAIL_NORMAL, NORMAL};

const KV3_HEADER: &str = "<!-- kv3 encoding:text:version{e21c7f3c-8a33-41c5-9977-a76d3a32aa0d} format:generic:version{7412167c-06e9-4698-aff2-e63eb59037e7} -->";
const DEFAULT_COLOR: &str = "materials/default/default_color.tga";
const DEFAULT_MATERIAL: &str = "materials/default.vmat";

/// `./<file name>` reference used for files next to the `.vmdl`.
fn sibling_ref(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("./{}", name)
}

/// Forward-slash path relative to `base`, or the path itself when it is not
/// below `base`.
fn relative_ref(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Material text for the derived textures of one model.
pub fn vmat_content(
    derived: &DerivedTextureSet,
    params: &MaterialParams,
    base: &Path,
) -> Result<String, fmt::Error> {
    let tex = |name: &str| derived.get(name).map(|p| relative_ref(p, base));

    let mut out = String::new();
    out.push_str("// THIS FILE IS AUTO-GENERATED\n\nLayer0\n{\n");
    out.push_str("\tshader \"shaders/complex.shader\"\n\n");

    let color = tex("albedo").unwrap_or_else(|| DEFAULT_COLOR.to_string());
    writeln!(out, "\tTextureColor \"{}\"", color)?;

    if let Some(normal) = tex(NORMAL) {
        writeln!(out, "\tTextureNormal \"{}\"", normal)?;
        writeln!(out, "\tg_flNormalStrength \"{:.3}\"", params.normal_strength)?;
    }

    if let Some(specular) = tex("specular") {
        writeln!(out, "\tTextureSpecular \"{}\"", specular)?;
    }
    writeln!(out, "\tg_flSpecularLevel \"{:.3}\"", params.specular_level)?;

    if let Some(detail) = tex(DETAIL_FINAL) {
        out.push_str("\n\tF_DETAIL_TEXTURE 1\n");
        writeln!(out, "\tTextureDetail \"{}\"", detail)?;
        if let Some(detail_normal) = tex(DETAIL_NORMAL) {
            writeln!(out, "\tTextureDetailNormal \"{}\"", detail_normal)?;
        }
        writeln!(out, "\tg_flDetailTexCoordScale \"{:.3}\"", params.detail_scale)?;
    }

    out.push_str("}\n");
    Ok(out)
}

/// Model text listing LOD meshes, collision and the material.
pub fn vmdl_content(
    model_name: &str,
    model: &ModelData,
    vmat_path: Option<&Path>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    out.push_str(KV3_HEADER);
    out.push_str("\n{\n");

    out.push_str("\tRenderMeshList = \n\t[\n");
    if model.lod_files.is_empty() {
        writeln!(out, "\t\t{{\n\t\t\tMesh = \"./{}_LOD0.fbx\"\n\t\t\tLOD = 0\n\t\t}},", model_name)?;
    } else {
        for (i, lod) in model.lod_files.iter().enumerate() {
            writeln!(
                out,
                "\t\t// LOD Level {i}\n\t\t{{\n\t\t\tMesh = \"{}\"\n\t\t\tLOD = {i}\n\t\t}},",
                sibling_ref(lod)
            )?;
        }
    }
    out.push_str("\t]\n");

    out.push_str("\tPhysicsShapeList = \n\t[\n\t\t{\n");
    if let Some(physics) = &model.physics_file {
        writeln!(out, "\t\t\tShape = \"{}\"", sibling_ref(physics))?;
    }
    out.push_str("\t\t\tPhysicsType = \"PhysicsMeshFromRender\"\n\t\t},\n\t]\n");

    out.push_str("\tGameDataList = \n\t[\n\t\t{\n\t\t\tGameData = \"static_prop\"\n\t\t}\n\t]\n");

    let material = vmat_path
        .map(sibling_ref)
        .unwrap_or_else(|| DEFAULT_MATERIAL.to_string());
    writeln!(out, "\tDefaultMaterialGroup = \"{}\"", material)?;
    writeln!(out, "\tScale = {:?}", model.scale_applied)?;

    out.push_str("}\n");
    Ok(out)
}

/// Write `<name>.vmat` into `output_dir`.
pub fn generate_vmat(
    model_name: &str,
    derived: &DerivedTextureSet,
    params: &MaterialParams,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.vmat", model_name));
    std::fs::write(&path, vmat_content(derived, params, output_dir)?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Material written: {}", path.display());
    Ok(path)
}

/// Write `<name>.vmdl` into `output_dir`.
pub fn generate_vmdl(
    model_name: &str,
    model: &ModelData,
    vmat_path: Option<&Path>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.vmdl", model_name));
    std::fs::write(&path, vmdl_content(model_name, model, vmat_path)?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Model written: {}", path.display());
    Ok(path)
}
