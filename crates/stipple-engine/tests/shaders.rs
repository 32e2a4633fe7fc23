//! Parses and validates the WGSL sources and checks them against the host
//! side layouts.

use naga::valid::{Capabilities, ValidationFlags, Validator};

const QUAD_WGSL: &str = include_str!("../src/render/pipelines/shaders/quad.wgsl");
const DOT_WGSL: &str = include_str!("../src/render/pipelines/shaders/dot.wgsl");

fn parse(src: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(src).expect("wgsl parses");
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .expect("wgsl validates");
    module
}

fn entry_points(module: &naga::Module) -> Vec<(String, naga::ShaderStage)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.name.clone(), ep.stage))
        .collect()
}

/// `(group, binding, address space, span)` for every resource binding.
fn bindings(module: &naga::Module) -> Vec<(u32, u32, naga::AddressSpace, u32)> {
    let mut out: Vec<_> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            let span = module.types[var.ty].inner.size(module.to_ctx());
            Some((rb.group, rb.binding, var.space, span))
        })
        .collect();
    out.sort_by_key(|(g, b, _, _)| (*g, *b));
    out
}

fn vertex_locations(module: &naga::Module) -> Vec<u32> {
    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Vertex)
        .expect("vertex entry point");

    let mut locations = Vec::new();
    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => locations.push(*location),
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for m in members {
                        if let Some(naga::Binding::Location { location, .. }) = &m.binding {
                            locations.push(*location);
                        }
                    }
                }
            }
        }
    }
    locations.sort_unstable();
    locations
}

#[test]
fn quad_shader_is_valid() {
    let module = parse(QUAD_WGSL);
    let eps = entry_points(&module);
    assert!(eps.contains(&("vs_main".into(), naga::ShaderStage::Vertex)));
    assert!(eps.contains(&("fs_main".into(), naga::ShaderStage::Fragment)));
}

#[test]
fn quad_shader_bindings() {
    let module = parse(QUAD_WGSL);
    let b = bindings(&module);
    assert_eq!(b.len(), 3);

    assert_eq!((b[0].0, b[0].1), (0, 0));
    assert_eq!(b[0].2, naga::AddressSpace::Uniform);
    assert_eq!(b[0].3, 16);

    assert_eq!((b[1].0, b[1].1), (1, 0));
    assert_eq!(b[1].2, naga::AddressSpace::Handle);
    assert_eq!((b[2].0, b[2].1), (1, 1));
    assert_eq!(b[2].2, naga::AddressSpace::Handle);

    assert_eq!(vertex_locations(&module), vec![0]);
}

#[test]
fn dot_shader_is_valid() {
    let module = parse(DOT_WGSL);
    let eps = entry_points(&module);
    assert!(eps.contains(&("vs_main".into(), naga::ShaderStage::Vertex)));
    assert!(eps.contains(&("fs_main".into(), naga::ShaderStage::Fragment)));
}

#[test]
fn dot_shader_bindings() {
    let module = parse(DOT_WGSL);
    let b = bindings(&module);
    assert_eq!(b, vec![(0, 0, naga::AddressSpace::Uniform, 16)]);
}

#[test]
fn dot_shader_vertex_locations_match_instance_layout() {
    let module = parse(DOT_WGSL);
    assert_eq!(vertex_locations(&module), vec![0, 1, 2, 3, 4]);
}
