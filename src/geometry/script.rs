use std::path::Path;

use crate::config::GeometryConfig;

/// Forward-slash path for embedding in a Python raw string.
fn python_path(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\\', "/")
}

fn python_list(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", items.join(", "))
}

/// Build the Blender automation script for one model.
///
/// The script imports the model, applies the global scale, exports one FBX
/// per LOD ratio (`<base>.fbx`, `<base>_LOD1.fbx`, ...), a decimated
/// `<base>_physics.fbx`, and writes `<base>_processing_info.json`.
pub fn generate(model_path: &Path, output_base: &Path, config: &GeometryConfig) -> String {
    let model = python_path(model_path);
    let base = python_path(output_base);
    let scale = format!("{:?}", config.global_scale);
    let lods = python_list(&config.lod_levels);
    let physics_ratio = format!("{:?}", config.physics_decimation_ratio);

    format!(
        r#"import json
import bpy
from mathutils import Vector

MODEL = r"{model}"
BASE = r"{base}"
SCALE = {scale}
LOD_LEVELS = {lods}
PHYSICS_RATIO = {physics_ratio}

bpy.ops.wm.read_factory_settings(use_empty=True)
bpy.ops.import_scene.fbx(filepath=MODEL)

for obj in bpy.context.scene.objects:
    obj.scale = Vector((SCALE, SCALE, SCALE))
bpy.ops.object.select_all(action='SELECT')
bpy.ops.object.transform_apply(location=True, rotation=True, scale=True)

meshes = [o for o in bpy.context.scene.objects if o.type == 'MESH']
if not meshes:
    raise RuntimeError("no mesh objects in " + MODEL)
source = meshes[0]


def decimated_copy(name, ratio):
    bpy.ops.object.select_all(action='DESELECT')
    source.select_set(True)
    bpy.context.view_layer.objects.active = source
    bpy.ops.object.duplicate()
    copy = bpy.context.active_object
    copy.name = name
    if ratio < 1.0:
        mod = copy.modifiers.new(name="Decimate", type='DECIMATE')
        mod.ratio = ratio
        bpy.ops.object.modifier_apply(modifier=mod.name)
    return copy


def export_only(obj, path):
    bpy.ops.object.select_all(action='DESELECT')
    obj.select_set(True)
    bpy.context.view_layer.objects.active = obj
    bpy.ops.export_scene.fbx(
        filepath=path,
        use_selection=True,
        apply_scale_options='FBX_SCALE_ALL',
        mesh_smooth_type='EDGE',
        add_leaf_bones=False,
        path_mode='COPY',
    )


lod_files = []
for i, ratio in enumerate(LOD_LEVELS):
    lod = decimated_copy(source.name + "_LOD" + str(i), ratio)
    path = BASE + ("" if i == 0 else "_LOD" + str(i)) + ".fbx"
    export_only(lod, path)
    lod_files.append(path)
    bpy.ops.object.delete()

physics = decimated_copy(source.name + "_physics", PHYSICS_RATIO)
physics_path = BASE + "_physics.fbx"
export_only(physics, physics_path)

with open(BASE + "_processing_info.json", "w") as f:
    json.dump({{
        "lod_files": lod_files,
        "physics_file": physics_path,
        "original_file": MODEL,
        "scale_applied": SCALE,
    }}, f, indent=2)
"#
    )
}
